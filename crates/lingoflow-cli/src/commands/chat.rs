use std::io::{self, Write};

use colored::Colorize;
use lingoflow_core::{ChatRole, Session};
use lingoflow_llm::{Assistant, TurnOutcome};
use lingoflow_observability::create_session_span;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::app::App;

const HELP: &str = "Type a question. `/save` copies the last answer into notes, `exit` leaves. Ctrl-C stops a running answer.";

pub async fn run(app: &App, id: &str) -> anyhow::Result<()> {
    let mut session = app.open(id)?;
    let span = create_session_span(&session.id, Some(&session.topic));

    let mut assistant = Assistant::new(app.provider()?);
    if let Some(model) = &app.config.llm.chat_model {
        assistant = assistant.with_model(model);
    }

    println!("{}", format!("🤖 Assistant · {}", session.topic).cyan().bold());
    println!("{}", HELP.dimmed());
    print_history(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.is_empty() {
            continue;
        }
        if input == "/save" {
            save_last_answer(app, &mut session).await?;
            continue;
        }

        let outcome = ask(&assistant, &mut session, input)
            .instrument(span.clone())
            .await?;
        match outcome {
            TurnOutcome::Completed => println!(),
            TurnOutcome::Cancelled => println!("{}", " [stopped]".dimmed()),
            TurnOutcome::Failed { .. } => {
                println!();
                if let Some(reply) = session.chat_history.last() {
                    println!("{}", reply.text.red());
                }
            }
        }
        println!();

        app.sessions.update(session.clone()).await?;
    }

    app.sessions.close();
    println!("{}", "👋 Goodbye!".cyan());
    Ok(())
}

/// One streamed turn; Ctrl-C cancels it
async fn ask(
    assistant: &Assistant,
    session: &mut Session,
    input: &str,
) -> anyhow::Result<TurnOutcome> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    print!("{} ", "Assistant:".green().bold());
    io::stdout().flush()?;

    let outcome = assistant
        .send(session, input, &cancel, |fragment, _| {
            print!("{}", fragment);
            let _ = io::stdout().flush();
        })
        .await;
    watcher.abort();

    Ok(outcome?)
}

async fn save_last_answer(app: &App, session: &mut Session) -> anyhow::Result<()> {
    let last = session
        .chat_history
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::Model && !m.text.is_empty())
        .map(|m| m.text.clone());

    let Some(text) = last else {
        println!("{}", "Nothing to save yet".yellow());
        return Ok(());
    };

    if app
        .sessions
        .capture_note(&session.id, &text, chrono::Local::now())
        .await?
    {
        if let Some(updated) = app.sessions.get(&session.id) {
            session.notes = updated.notes;
            session.last_modified = updated.last_modified;
        }
        println!("{}", "📝 Saved to notes".green());
    }
    Ok(())
}

fn print_history(session: &Session) {
    for message in &session.chat_history {
        match message.role {
            ChatRole::User => println!("{} {}", "You:".cyan().bold(), message.text),
            ChatRole::Model => println!("{} {}", "Assistant:".green().bold(), message.text),
        }
    }
    if !session.chat_history.is_empty() {
        println!();
    }
}
