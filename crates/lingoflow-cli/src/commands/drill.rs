use std::io::{self, Write};
use std::sync::Arc;

use colored::Colorize;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use lingoflow_core::{NullSpeaker, Session, Speaker};
use lingoflow_drill::{DrillError, DrillRunner, DrillSnapshot, DrillState};
use lingoflow_observability::create_drill_span;
use tracing::{debug, info, Instrument};

use crate::app::App;
use crate::collab::CommandSpeaker;

const BAR_WIDTH: usize = 40;

pub async fn run(app: &App, id: &str) -> anyhow::Result<()> {
    let session = app.open(id)?;
    let span = create_drill_span(&session.id, session.terms.len());
    run_session(app, &session).instrument(span).await
}

async fn run_session(app: &App, session: &Session) -> anyhow::Result<()> {
    let speaker: Arc<dyn Speaker> = match CommandSpeaker::from_config(&app.config.speech) {
        Some(speaker) => Arc::new(speaker),
        None => Arc::new(NullSpeaker),
    };
    let runner = DrillRunner::new(app.drill_timing(), speaker);

    let mut handle = match runner.start(session.terms.clone()) {
        Ok(handle) => handle,
        Err(DrillError::EmptyGlossary) => {
            println!("{}", "📭 This notebook has no terms yet. Add some with `lingoflow term add`.".yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let screen = Screen::enter()?;
    let mut snapshots = handle.watch();
    let mut keys = EventStream::new();
    screen.draw(&session.topic, &snapshots.borrow().clone())?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                screen.draw(&session.topic, &snapshot)?;
            }
            transition = handle.next_transition() => {
                match transition {
                    Some(DrillState::Exited) | None => break,
                    Some(state) => debug!("Drill moved to {:?}", state),
                }
            }
            key = keys.next() => {
                match key {
                    Some(Ok(Event::Key(key))) => match action_for(&key) {
                        Some(Action::Restart) => {
                            // ignored by the runner unless the run is complete
                            let _ = handle.restart();
                        }
                        Some(Action::Quit) => {
                            let _ = handle.exit();
                            break;
                        }
                        None => {}
                    },
                    Some(Ok(Event::Resize(..))) => screen.draw(&session.topic, &handle.snapshot())?,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }
    }

    drop(screen);
    handle.finished().await;
    app.sessions.close();
    info!("Drill closed");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Restart,
    Quit,
}

fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('r') => Some(Action::Restart),
        _ => None,
    }
}

/// Raw-mode alternate screen, restored on drop
struct Screen;

impl Screen {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }

    fn draw(&self, topic: &str, snapshot: &DrillSnapshot) -> io::Result<()> {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let lines = frame_lines(topic, snapshot);
        let top = rows.saturating_sub(lines.len() as u16) / 2;

        let mut out = io::stdout();
        queue!(out, Clear(ClearType::All))?;
        for (i, line) in lines.iter().enumerate() {
            let width = line.chars().count() as u16;
            let left = cols.saturating_sub(width) / 2;
            queue!(out, MoveTo(left, top + i as u16), Print(line))?;
        }
        out.flush()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Plain text rows for one frame
fn frame_lines(topic: &str, snapshot: &DrillSnapshot) -> Vec<String> {
    let mut lines = vec![format!("⚡ Rapid Fire · {}", topic), String::new()];

    match snapshot.state {
        DrillState::Countdown { remaining } => {
            lines.push("Get ready".to_string());
            lines.push(String::new());
            lines.push(remaining.to_string());
        }
        DrillState::Presenting { index, revealed } => {
            lines.push(format!("{} / {}", index + 1, snapshot.total));
            lines.push(String::new());
            if let Some(term) = &snapshot.term {
                lines.push(term.english.clone());
                lines.push(String::new());
                if revealed {
                    lines.push(term.chinese.clone());
                } else {
                    lines.push(progress_bar(snapshot.progress));
                }
            }
        }
        DrillState::Complete => {
            lines.push("✅ Drill complete".to_string());
            lines.push(String::new());
            lines.push(format!("{} terms reviewed", snapshot.total));
            lines.push(String::new());
            lines.push("r: run again   q: quit".to_string());
            return lines;
        }
        DrillState::Exited => {}
    }

    lines.push(String::new());
    lines.push("q: quit".to_string());
    lines
}

/// `progress` runs from 100.0 down to 0.0
fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}
