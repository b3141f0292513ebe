//! Async driver for [`DrillMachine`].
//!
//! The driver owns two timer slots: one repeating progress animation and one
//! delayed callback (countdown step or reveal hold). Arming a slot aborts the
//! task it held before, and every tick carries the slot generation it was
//! armed with, so a tick that was already in flight when its slot was re-armed
//! or cancelled is dropped instead of applied.

use std::sync::Arc;
use std::time::Duration;

use lingoflow_core::{Speaker, Term};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, info_span, Instrument};

use crate::error::{DrillError, DrillResult};
use crate::machine::{DrillEffect, DrillEvent, DrillMachine, DrillState};
use crate::timing::DrillTiming;

/// What a renderer needs to draw the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct DrillSnapshot {
    pub state: DrillState,
    /// 100.0 down to 0.0
    pub progress: f64,
    pub term: Option<Term>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Progress,
    Delay,
}

#[derive(Debug)]
struct Tick {
    slot: Slot,
    generation: u64,
    event: DrillEvent,
}

struct TimerSlot {
    slot: Slot,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    fn new(slot: Slot) -> Self {
        Self {
            slot,
            generation: 0,
            handle: None,
        }
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    fn arm_once(&mut self, delay: Duration, event: DrillEvent, tx: &mpsc::UnboundedSender<Tick>) {
        self.cancel();
        let tick = Tick {
            slot: self.slot,
            generation: self.generation,
            event,
        };
        let tx = tx.clone();
        self.handle = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(tick);
        }));
    }

    fn arm_repeating(&mut self, every: Duration, event: DrillEvent, tx: &mpsc::UnboundedSender<Tick>) {
        self.cancel();
        let (slot, generation) = (self.slot, self.generation);
        let every = every.max(Duration::from_millis(1));
        let tx = tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let tick = Tick {
                    slot,
                    generation,
                    event,
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        }));
    }

    fn accepts(&self, tick: &Tick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Driver {
    machine: DrillMachine,
    speaker: Arc<dyn Speaker>,
    progress: TimerSlot,
    delay: TimerSlot,
    ticks_tx: mpsc::UnboundedSender<Tick>,
    snapshot_tx: watch::Sender<DrillSnapshot>,
    transitions_tx: mpsc::UnboundedSender<DrillState>,
}

impl Driver {
    async fn run(
        mut self,
        mut ticks_rx: mpsc::UnboundedReceiver<Tick>,
        mut commands_rx: mpsc::UnboundedReceiver<DrillEvent>,
        cancel: CancellationToken,
    ) {
        let now = Instant::now();
        let effects = self.machine.start(now);
        let _ = self.transitions_tx.send(self.machine.state());
        self.apply(effects);
        self.publish(now);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Drill handle dropped");
                    break;
                }
                command = commands_rx.recv() => match command {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
                Some(tick) = ticks_rx.recv() => {
                    let slot = match tick.slot {
                        Slot::Progress => &self.progress,
                        Slot::Delay => &self.delay,
                    };
                    if slot.accepts(&tick) {
                        self.dispatch(tick.event);
                    } else {
                        debug!("Discarding stale {:?} tick", tick.event);
                    }
                }
            }

            if self.machine.state().is_exited() {
                break;
            }
        }

        self.progress.cancel();
        self.delay.cancel();
    }

    fn dispatch(&mut self, event: DrillEvent) {
        let before = self.machine.state();
        let now = Instant::now();
        let effects = self.machine.handle(event, now);
        let after = self.machine.state();
        if after != before {
            debug!("Drill {:?} -> {:?}", before, after);
            let _ = self.transitions_tx.send(after);
        }
        self.apply(effects);
        self.publish(now);
    }

    fn apply(&mut self, effects: Vec<DrillEffect>) {
        for effect in effects {
            match effect {
                DrillEffect::ScheduleCountdownTick(delay) => {
                    self.delay
                        .arm_once(delay, DrillEvent::CountdownTick, &self.ticks_tx)
                }
                DrillEffect::StartProgress => {
                    let every = self.machine.timing().frame_interval;
                    self.progress
                        .arm_repeating(every, DrillEvent::Frame, &self.ticks_tx)
                }
                DrillEffect::CancelProgress => self.progress.cancel(),
                DrillEffect::Speak { text, lang } => self.speaker.speak(&text, &lang),
                DrillEffect::ScheduleHold(delay) => {
                    self.delay
                        .arm_once(delay, DrillEvent::HoldElapsed, &self.ticks_tx)
                }
                DrillEffect::CancelAll => {
                    self.progress.cancel();
                    self.delay.cancel();
                }
                DrillEffect::Completed => info!("Drill complete ({} terms)", self.machine.len()),
                DrillEffect::Exited => info!("Drill exited"),
            }
        }
    }

    fn publish(&self, now: Instant) {
        self.snapshot_tx.send_replace(snapshot_of(&self.machine, now));
    }
}

fn snapshot_of(machine: &DrillMachine, now: Instant) -> DrillSnapshot {
    DrillSnapshot {
        state: machine.state(),
        progress: machine.progress(now),
        term: machine.current_term().cloned(),
        total: machine.len(),
    }
}

/// Starts drill runs with a fixed timing and speaker
pub struct DrillRunner {
    timing: DrillTiming,
    speaker: Arc<dyn Speaker>,
}

impl DrillRunner {
    pub fn new(timing: DrillTiming, speaker: Arc<dyn Speaker>) -> Self {
        Self { timing, speaker }
    }

    /// Start a run over a snapshot of `terms`. Must be called inside a tokio runtime.
    pub fn start(&self, terms: Vec<Term>) -> DrillResult<DrillHandle> {
        let machine = DrillMachine::new(terms, self.timing.clone())?;
        let total = machine.len();

        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (transitions_tx, transitions_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot_of(&machine, Instant::now()));
        let cancel = CancellationToken::new();

        let driver = Driver {
            machine,
            speaker: Arc::clone(&self.speaker),
            progress: TimerSlot::new(Slot::Progress),
            delay: TimerSlot::new(Slot::Delay),
            ticks_tx,
            snapshot_tx,
            transitions_tx,
        };
        let task = tokio::spawn(
            driver
                .run(ticks_rx, commands_rx, cancel.clone())
                .instrument(info_span!("drill", terms = total)),
        );

        info!("Drill started with {} terms", total);
        Ok(DrillHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
            transitions: transitions_rx,
            task: Some(task),
            _guard: cancel.drop_guard(),
        })
    }
}

/// Control surface of a running drill. Dropping it stops the run.
pub struct DrillHandle {
    commands: mpsc::UnboundedSender<DrillEvent>,
    snapshot: watch::Receiver<DrillSnapshot>,
    transitions: mpsc::UnboundedReceiver<DrillState>,
    task: Option<JoinHandle<()>>,
    _guard: DropGuard,
}

impl DrillHandle {
    /// Start over from the countdown; only honoured once the run is complete
    pub fn restart(&self) -> DrillResult<()> {
        self.commands
            .send(DrillEvent::Restart)
            .map_err(|_| DrillError::Closed)
    }

    /// Stop the run and drop all pending timers
    pub fn exit(&self) -> DrillResult<()> {
        self.commands
            .send(DrillEvent::Exit)
            .map_err(|_| DrillError::Closed)
    }

    pub fn snapshot(&self) -> DrillSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot
    pub fn watch(&self) -> watch::Receiver<DrillSnapshot> {
        self.snapshot.clone()
    }

    /// Next state change, `None` once the run has ended
    pub async fn next_transition(&mut self) -> Option<DrillState> {
        self.transitions.recv().await
    }

    /// Wait for the driver task to finish
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
