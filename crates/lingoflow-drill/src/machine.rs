//! Pure drill state machine.
//!
//! Transitions are a function of `(state, event, now)`. The machine never
//! sleeps or spawns; it returns [`DrillEffect`]s that a runner turns into
//! timers and speech. Card progress is derived from the time the card was
//! entered, so irregular frame delivery cannot speed it up or slow it down.

use std::time::Duration;

use lingoflow_core::Term;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{DrillError, DrillResult};
use crate::timing::DrillTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillState {
    Countdown { remaining: u32 },
    Presenting { index: usize, revealed: bool },
    Complete,
    Exited,
}

impl DrillState {
    pub fn is_exited(&self) -> bool {
        matches!(self, Self::Exited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillEvent {
    /// One countdown step elapsed
    CountdownTick,
    /// Progress re-evaluation
    Frame,
    /// Reveal hold elapsed
    HoldElapsed,
    Restart,
    Exit,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum DrillEffect {
    /// Arm the delayed slot to deliver `CountdownTick` after the delay
    ScheduleCountdownTick(Duration),
    /// Arm the progress slot to deliver `Frame` repeatedly
    StartProgress,
    CancelProgress,
    Speak { text: String, lang: String },
    /// Arm the delayed slot to deliver `HoldElapsed` after the delay
    ScheduleHold(Duration),
    /// Drop every pending timer
    CancelAll,
    Completed,
    Exited,
}

pub struct DrillMachine {
    terms: Vec<Term>,
    timing: DrillTiming,
    state: DrillState,
    card_entered_at: Option<Instant>,
}

impl DrillMachine {
    /// Take a snapshot of `terms` for one run
    pub fn new(terms: Vec<Term>, timing: DrillTiming) -> DrillResult<Self> {
        if terms.is_empty() {
            return Err(DrillError::EmptyGlossary);
        }
        Ok(Self {
            state: DrillState::Countdown {
                remaining: timing.countdown_from,
            },
            terms,
            timing,
            card_entered_at: None,
        })
    }

    /// Effects that kick off the initial countdown
    pub fn start(&mut self, now: Instant) -> Vec<DrillEffect> {
        self.enter_countdown(now)
    }

    pub fn state(&self) -> DrillState {
        self.state
    }

    pub fn timing(&self) -> &DrillTiming {
        &self.timing
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term on screen, if a card is being presented
    pub fn current_term(&self) -> Option<&Term> {
        match self.state {
            DrillState::Presenting { index, .. } => self.terms.get(index),
            _ => None,
        }
    }

    /// Percentage of the card timer remaining, 100 down to 0
    pub fn progress(&self, now: Instant) -> f64 {
        match (self.state, self.card_entered_at) {
            (DrillState::Presenting { revealed: false, .. }, Some(entered)) => {
                let elapsed = now.saturating_duration_since(entered);
                let total = self.timing.card_duration;
                if elapsed >= total || total.is_zero() {
                    0.0
                } else {
                    (100.0 - elapsed.as_secs_f64() / total.as_secs_f64() * 100.0).max(0.0)
                }
            }
            (DrillState::Countdown { .. }, _) => 100.0,
            _ => 0.0,
        }
    }

    /// Apply one event. Events that do not fit the current state are ignored.
    pub fn handle(&mut self, event: DrillEvent, now: Instant) -> Vec<DrillEffect> {
        use DrillEvent::*;
        use DrillState::*;

        match (self.state, event) {
            (Exited, _) => Vec::new(),
            (_, Exit) => {
                self.state = Exited;
                self.card_entered_at = None;
                vec![DrillEffect::CancelAll, DrillEffect::Exited]
            }
            (Countdown { remaining }, CountdownTick) => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.enter_card(0, now)
                } else {
                    self.state = Countdown { remaining };
                    vec![DrillEffect::ScheduleCountdownTick(self.timing.countdown_step)]
                }
            }
            (Presenting { index, revealed: false }, Frame) => {
                if self.progress(now) > 0.0 {
                    Vec::new()
                } else {
                    self.reveal(index)
                }
            }
            (Presenting { index, revealed: true }, HoldElapsed) => {
                if index + 1 >= self.terms.len() {
                    self.state = Complete;
                    self.card_entered_at = None;
                    vec![DrillEffect::Completed]
                } else {
                    self.enter_card(index + 1, now)
                }
            }
            (Complete, Restart) => self.enter_countdown(now),
            (state, event) => {
                debug!("Ignoring {:?} in {:?}", event, state);
                Vec::new()
            }
        }
    }

    fn enter_countdown(&mut self, now: Instant) -> Vec<DrillEffect> {
        self.card_entered_at = None;
        if self.timing.countdown_from == 0 {
            return self.enter_card(0, now);
        }
        self.state = DrillState::Countdown {
            remaining: self.timing.countdown_from,
        };
        vec![DrillEffect::ScheduleCountdownTick(self.timing.countdown_step)]
    }

    fn enter_card(&mut self, index: usize, now: Instant) -> Vec<DrillEffect> {
        self.state = DrillState::Presenting {
            index,
            revealed: false,
        };
        self.card_entered_at = Some(now);
        vec![DrillEffect::StartProgress]
    }

    fn reveal(&mut self, index: usize) -> Vec<DrillEffect> {
        self.state = DrillState::Presenting {
            index,
            revealed: true,
        };
        let text = self.terms[index].chinese.clone();
        vec![
            DrillEffect::CancelProgress,
            DrillEffect::Speak {
                text,
                lang: self.timing.speech_lang.clone(),
            },
            DrillEffect::ScheduleHold(self.timing.reveal_hold),
        ]
    }
}
