use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use lingoflow_core::glossary::{self, csv_file_name};
use lingoflow_core::{package_file_name, Session};
use lingoflow_llm::{PrepService, PREP_FAILURE_NOTICE};
use lingoflow_session::DeleteOutcome;
use tracing::error;

use crate::app::App;
use crate::{ExportFormat, NotesArgs};

pub async fn prep(app: &App, topic: &str) -> anyhow::Result<()> {
    let topic = topic.trim();
    if topic.is_empty() {
        bail!("Topic must not be empty");
    }

    let mut service = PrepService::new(app.provider()?);
    if let Some(model) = &app.config.llm.prep_model {
        service = service.with_model(model);
    }

    println!("{}", format!("🔎 Preparing \"{}\"...", topic).cyan());
    let material = match service.acquire(topic).await {
        Ok(material) => material,
        Err(e) => {
            error!("Prep material acquisition failed: {}", e);
            bail!(PREP_FAILURE_NOTICE);
        }
    };

    let session = app.sessions.create_from_prep(topic, material).await?;
    println!(
        "{}",
        format!(
            "✅ Notebook {} created: {} briefing points, {} terms",
            short_id(&session.id),
            session.summary.len(),
            session.terms.len()
        )
        .green()
    );
    Ok(())
}

pub fn list(app: &App) -> anyhow::Result<()> {
    let sessions = app.sessions.list();
    if sessions.is_empty() {
        println!("{}", "No notebooks yet. Start with `lingoflow prep <topic>`.".dimmed());
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {}  {}",
            short_id(&session.id).yellow(),
            session.topic.bold(),
            format!(
                "{} terms · {}",
                session.terms.len(),
                session.last_modified.format("%Y-%m-%d %H:%M")
            )
            .dimmed()
        );
    }
    Ok(())
}

pub fn show(app: &App, id: &str) -> anyhow::Result<()> {
    let session = app.open(id)?;
    print_session(&session);
    Ok(())
}

fn print_session(session: &Session) {
    println!("{}", session.topic.cyan().bold());
    println!(
        "{}",
        format!(
            "id {} · created {} · modified {}",
            session.id,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.last_modified.format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );

    if !session.summary.is_empty() {
        println!();
        println!("{}", "Briefing".bold());
        for point in &session.summary {
            println!("  • {}", point);
        }
    }

    println!();
    println!("{}", format!("Glossary ({})", session.terms.len()).bold());
    for term in &session.terms {
        println!(
            "  {}  {} — {}  {}",
            short_id(&term.id).dimmed(),
            term.english.green(),
            term.chinese.yellow(),
            term.definition.dimmed()
        );
    }

    if !session.notes.is_empty() {
        println!();
        println!("{}", "Notes".bold());
        println!("{}", session.notes);
    }

    if !session.chat_history.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} assistant messages", session.chat_history.len()).dimmed()
        );
    }
}

pub async fn rename(app: &App, id: &str, topic: &str) -> anyhow::Result<()> {
    let session = app.sessions.resolve(id)?;
    if app.sessions.rename(&session.id, topic).await? {
        println!("{}", format!("✅ Renamed to \"{}\"", topic.trim()).green());
    } else {
        println!("{}", "⚠️  Topic unchanged (blank name)".yellow());
    }
    Ok(())
}

pub async fn delete(app: &App, id: &str) -> anyhow::Result<()> {
    let session = app.sessions.resolve(id)?;
    match app.sessions.delete(&session.id, app.confirmer()).await? {
        DeleteOutcome::Deleted { .. } => {
            println!("{}", format!("🗑️  Deleted \"{}\"", session.topic).green())
        }
        DeleteOutcome::Declined => println!("{}", "Cancelled".dimmed()),
    }
    Ok(())
}

pub async fn export(
    app: &App,
    id: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let session = app.sessions.resolve(id)?;
    let (content, default_name) = match format {
        ExportFormat::Csv => (
            glossary::export_csv(&session.terms),
            csv_file_name(&session.topic),
        ),
        ExportFormat::Json => (
            app.sessions.export(&session)?,
            package_file_name(&session.topic),
        ),
    };

    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    if path == Path::new("-") {
        print!("{}", content);
        return Ok(());
    }

    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("failed to write {:?}", path))?;
    println!("{}", format!("✅ Exported to {}", path.display()).green());
    Ok(())
}

pub async fn import(app: &App, file: &Path, into: Option<String>) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {:?}", file))?;

    let is_csv = file
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if !is_csv {
        let session = app.sessions.import(&content).await?;
        println!(
            "{}",
            format!(
                "✅ Imported \"{}\" as {}",
                session.topic,
                short_id(&session.id)
            )
            .green()
        );
        return Ok(());
    }

    let Some(target) = into else {
        bail!("CSV import needs a target notebook: --into <id>");
    };
    let mut session = app.sessions.resolve(&target)?;
    let rows = glossary::import_csv(&content)?;
    let added = glossary::merge_into(&mut session, rows);
    app.sessions.update(session.clone()).await?;
    println!(
        "{}",
        format!("✅ Added {} terms to \"{}\"", added, session.topic).green()
    );
    Ok(())
}

pub async fn notes(app: &App, args: NotesArgs) -> anyhow::Result<()> {
    let session = app.sessions.resolve(&args.id)?;

    if let Some(text) = args.set {
        let changed = app.sessions.set_notes(&session.id, &text).await?;
        let message = if changed { "✅ Notes saved" } else { "Notes unchanged" };
        println!("{}", message.green());
    } else if let Some(snippet) = args.capture {
        if app
            .sessions
            .capture_note(&session.id, &snippet, chrono::Local::now())
            .await?
        {
            println!("{}", "✅ Snippet captured".green());
        } else {
            println!("{}", "⚠️  Nothing to capture".yellow());
        }
    } else if session.notes.is_empty() {
        println!("{}", "(no notes)".dimmed());
    } else {
        println!("{}", session.notes);
    }
    Ok(())
}

/// First block of a uuid, enough to address a notebook from the shell
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("3f2a9c1e-0000-4000-8000-000000000000"), "3f2a9c1e");
        assert_eq!(short_id("plain"), "plain");
    }
}
