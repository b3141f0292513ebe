use std::io::{self, BufRead, Write};

use anyhow::Context;
use colored::Colorize;
use lingoflow_core::{GlossaryEditor, TermDraft};

use crate::app::{resolve_term, App};
use crate::TermCommands;

pub async fn handle(app: &App, command: TermCommands) -> anyhow::Result<()> {
    let mut editor = GlossaryEditor::new();

    match command {
        TermCommands::Add {
            id,
            english,
            chinese,
        } => {
            let mut session = app.sessions.resolve(&id)?;
            let term_id = editor.add_term(&mut session);
            let draft = match (english, chinese) {
                (None, None) => prompt_draft(&TermDraft::default())?,
                (english, chinese) => {
                    TermDraft::new(english.unwrap_or_default(), chinese.unwrap_or_default())
                }
            };
            editor.save_edit_with(&mut session, &term_id, &draft)?;
            app.sessions.update(session).await?;
            println!(
                "{}",
                format!("✅ Added \"{}\" / \"{}\"", draft.english, draft.chinese).green()
            );
        }
        TermCommands::Edit {
            id,
            term,
            english,
            chinese,
        } => {
            let mut session = app.sessions.resolve(&id)?;
            let term_id = resolve_term(&session, &term)?.id.clone();
            let draft = editor.begin_edit(&session, &term_id)?;

            if english.is_none() && chinese.is_none() {
                *draft = prompt_draft(draft)?;
            } else {
                if let Some(english) = english {
                    draft.english = english;
                }
                if let Some(chinese) = chinese {
                    draft.chinese = chinese;
                }
            }

            editor.save_edit(&mut session)?;
            app.sessions.update(session).await?;
            println!("{}", "✅ Term saved".green());
        }
        TermCommands::Remove { id, term } => {
            let mut session = app.sessions.resolve(&id)?;
            let term_id = resolve_term(&session, &term)?.id.clone();
            if editor.remove_term(&mut session, &term_id, app.confirmer())? {
                app.sessions.update(session).await?;
                println!("{}", "🗑️  Term removed".green());
            } else {
                println!("{}", "Cancelled".dimmed());
            }
        }
    }
    Ok(())
}

/// Ask for both fields; an empty answer keeps the current value
fn prompt_draft(current: &TermDraft) -> anyhow::Result<TermDraft> {
    Ok(TermDraft::new(
        prompt_field("English", &current.english)?,
        prompt_field("Chinese", &current.chinese)?,
    ))
}

fn prompt_field(label: &str, current: &str) -> anyhow::Result<String> {
    if current.is_empty() {
        print!("{}: ", label.cyan());
    } else {
        print!("{} [{}]: ", label.cyan(), current);
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read input")?;
    let line = line.trim();
    Ok(if line.is_empty() {
        current.to_string()
    } else {
        line.to_string()
    })
}
