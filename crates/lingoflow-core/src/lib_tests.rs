use super::*;

fn prepared_session() -> Session {
    let raw = vec![
        RawTerm {
            english: "heat pump".into(),
            chinese: "热泵".into(),
            definition: "Moves heat against a gradient".into(),
        },
        RawTerm {
            english: "COP".into(),
            chinese: "性能系数".into(),
            definition: "Coefficient of performance".into(),
        },
    ];
    let topic = "Building decarbonisation";
    let terms = raw.into_iter().map(|r| r.into_term(topic)).collect();
    Session::new(topic, vec!["Heat pumps replace boilers".into()], terms)
}

#[test]
fn test_term_ids_unique_within_session() {
    let session = prepared_session();
    let mut ids: Vec<_> = session.terms.iter().map(|t| t.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), session.terms.len());
}

#[test]
fn test_edit_then_export_csv() {
    let mut session = prepared_session();
    let mut editor = GlossaryEditor::new();
    let id = editor.add_term(&mut session);
    editor
        .save_edit_with(&mut session, &id, &TermDraft::new("R290", "丙烷制冷剂"))
        .unwrap();

    let csv = glossary::export_csv(&session.terms);
    let first_row = csv.lines().nth(1).unwrap();
    assert_eq!(
        first_row,
        "\"R290\",\"丙烷制冷剂\",\"Manual Entry\",\"Building decarbonisation\""
    );
}

#[test]
fn test_csv_import_merges_into_other_session() {
    let source = prepared_session();
    let csv = glossary::export_csv(&source.terms);

    let mut target = Session::new("Heat networks", vec![], vec![]);
    let rows = glossary::import_csv(&csv).unwrap();
    assert_eq!(glossary::merge_into(&mut target, rows), 2);
    assert_eq!(target.terms[1].english, "COP");
    assert_eq!(target.terms[1].tags, vec!["Building decarbonisation".to_string()]);
    assert_ne!(target.terms[0].id, source.terms[0].id);
}

#[test]
fn test_package_keeps_mastery_untouched() {
    let mut session = prepared_session();
    session.terms[0].mastery_level = 3;
    let restored = import_package(&export_package(&session).unwrap()).unwrap();
    assert_eq!(restored.terms[0].mastery_level, 3);
    assert_eq!(restored.terms[1].mastery_level, 0);
}
