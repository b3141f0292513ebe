use tracing::{debug, info};

use super::error::{GlossaryError, GlossaryResult};
use crate::collab::Confirmer;
use crate::types::{Session, Term, TermId};

/// Working copy of the two editable fields of a row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDraft {
    pub english: String,
    pub chinese: String,
}

impl TermDraft {
    pub fn new(english: impl Into<String>, chinese: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            chinese: chinese.into(),
        }
    }

    pub fn from_term(term: &Term) -> Self {
        Self::new(term.english.clone(), term.chinese.clone())
    }
}

/// The single row currently in EDIT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub term_id: TermId,
    pub draft: TermDraft,
}

/// Row-level VIEW/EDIT state over a session's glossary.
///
/// Only one row is in EDIT at a time. Starting an edit on another row drops
/// the previous draft without touching the session.
#[derive(Debug, Default)]
pub struct GlossaryEditor {
    editing: Option<EditSession>,
}

impl GlossaryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self, term_id: &str) -> bool {
        self.editing.as_ref().is_some_and(|e| e.term_id == term_id)
    }

    /// Put a row into EDIT, seeding the draft from its current text
    pub fn begin_edit(&mut self, session: &Session, term_id: &str) -> GlossaryResult<&mut TermDraft> {
        let term = session
            .term(term_id)
            .ok_or_else(|| GlossaryError::TermNotFound(term_id.to_string()))?;
        if let Some(previous) = self.editing.as_ref().filter(|e| e.term_id != term_id) {
            debug!("Discarding draft for term {}", previous.term_id);
        }
        let editing = self.editing.insert(EditSession {
            term_id: term.id.clone(),
            draft: TermDraft::from_term(term),
        });
        Ok(&mut editing.draft)
    }

    /// Insert a blank row at the top of the glossary and start editing it
    pub fn add_term(&mut self, session: &mut Session) -> TermId {
        let term = Term::manual(&session.topic);
        let id = term.id.clone();
        session.prepend_term(term);
        self.editing = Some(EditSession {
            term_id: id.clone(),
            draft: TermDraft::default(),
        });
        info!("Added manual term {} to session {}", id, session.id);
        id
    }

    /// Write the current draft into the session and return to VIEW
    pub fn save_edit(&mut self, session: &mut Session) -> GlossaryResult<TermId> {
        let edit = self.editing.take().ok_or(GlossaryError::NotEditing)?;
        Self::apply(session, &edit.term_id, &edit.draft)?;
        Ok(edit.term_id)
    }

    /// Save an explicit draft for `term_id`, regardless of the current edit
    pub fn save_edit_with(
        &mut self,
        session: &mut Session,
        term_id: &str,
        draft: &TermDraft,
    ) -> GlossaryResult<()> {
        Self::apply(session, term_id, draft)?;
        if self.is_editing(term_id) {
            self.editing = None;
        }
        Ok(())
    }

    /// Leave EDIT without touching the session
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Remove a term after confirmation. Returns `false` if declined.
    pub fn remove_term(
        &mut self,
        session: &mut Session,
        term_id: &str,
        confirmer: &dyn Confirmer,
    ) -> GlossaryResult<bool> {
        let term = session
            .term(term_id)
            .ok_or_else(|| GlossaryError::TermNotFound(term_id.to_string()))?;
        let prompt = format!("Delete term \"{}\"?", term.english);
        if !confirmer.confirm(&prompt) {
            debug!("Removal of term {} declined", term_id);
            return Ok(false);
        }
        session.remove_term(term_id);
        if self.is_editing(term_id) {
            self.editing = None;
        }
        info!("Removed term {} from session {}", term_id, session.id);
        Ok(true)
    }

    fn apply(session: &mut Session, term_id: &str, draft: &TermDraft) -> GlossaryResult<()> {
        if session.set_term_text(term_id, &draft.english, &draft.chinese) {
            debug!("Saved term {}", term_id);
            Ok(())
        } else {
            Err(GlossaryError::TermNotFound(term_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::AutoConfirm;

    fn session() -> Session {
        Session::new(
            "LNG shipping",
            vec![],
            vec![
                Term::new("boil-off gas", "蒸发气", "d").with_tag("LNG shipping"),
                Term::new("regasification", "再气化", "d").with_tag("LNG shipping"),
            ],
        )
    }

    #[test]
    fn test_add_then_cancel_keeps_blank_row() {
        let mut session = session();
        let mut editor = GlossaryEditor::new();
        let id = editor.add_term(&mut session);
        assert!(editor.is_editing(&id));
        editor.cancel_edit();

        assert_eq!(session.terms.len(), 3);
        assert_eq!(session.terms[0].id, id);
        assert!(session.terms[0].english.is_empty());
        assert!(session.terms[0].chinese.is_empty());
        assert!(editor.editing().is_none());
    }

    #[test]
    fn test_save_edit_writes_draft() {
        let mut session = session();
        let mut editor = GlossaryEditor::new();
        let id = session.terms[1].id.clone();
        let before = session.last_modified;

        let draft = editor.begin_edit(&session, &id).unwrap();
        assert_eq!(draft.english, "regasification");
        draft.chinese = "再气化过程".into();

        assert_eq!(editor.save_edit(&mut session).unwrap(), id);
        assert_eq!(session.terms[1].chinese, "再气化过程");
        assert!(session.last_modified >= before);
        assert!(editor.editing().is_none());
    }

    #[test]
    fn test_empty_strings_are_accepted() {
        let mut session = session();
        let mut editor = GlossaryEditor::new();
        let id = session.terms[0].id.clone();
        editor
            .save_edit_with(&mut session, &id, &TermDraft::new("", ""))
            .unwrap();
        assert!(session.terms[0].english.is_empty());
    }

    #[test]
    fn test_switching_rows_drops_previous_draft() {
        let mut session = session();
        let mut editor = GlossaryEditor::new();
        let first = session.terms[0].id.clone();
        let second = session.terms[1].id.clone();

        editor.begin_edit(&session, &first).unwrap().english = "changed".into();
        editor.begin_edit(&session, &second).unwrap();

        assert!(editor.is_editing(&second));
        assert_eq!(session.terms[0].english, "boil-off gas");
        editor.save_edit(&mut session).unwrap();
        assert_eq!(session.terms[0].english, "boil-off gas");
    }

    #[test]
    fn test_save_without_edit_fails() {
        let mut session = session();
        let mut editor = GlossaryEditor::new();
        assert!(matches!(
            editor.save_edit(&mut session),
            Err(GlossaryError::NotEditing)
        ));
    }

    #[test]
    fn test_remove_requires_confirmation() {
        let mut session = session();
        let mut editor = GlossaryEditor::new();
        let id = session.terms[0].id.clone();

        assert!(!editor.remove_term(&mut session, &id, &AutoConfirm::no()).unwrap());
        assert_eq!(session.terms.len(), 2);

        editor.begin_edit(&session, &id).unwrap();
        assert!(editor.remove_term(&mut session, &id, &AutoConfirm::yes()).unwrap());
        assert_eq!(session.terms.len(), 1);
        assert!(editor.editing().is_none());

        assert!(matches!(
            editor.remove_term(&mut session, &id, &AutoConfirm::yes()),
            Err(GlossaryError::TermNotFound(_))
        ));
    }
}
