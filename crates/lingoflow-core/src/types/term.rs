use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Unique term identifier
pub type TermId = String;

/// Highest mastery level a term can carry
pub const MAX_MASTERY: u8 = 5;

/// Definition given to terms typed in by hand
pub const MANUAL_ENTRY_DEFINITION: &str = "Manual Entry";

/// One bilingual glossary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: TermId,
    pub english: String,
    pub chinese: String,
    pub definition: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "clamp_mastery")]
    pub mastery_level: u8,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl Term {
    /// Create a term with a fresh id and mastery 0
    pub fn new(
        english: impl Into<String>,
        chinese: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            english: english.into(),
            chinese: chinese.into(),
            definition: definition.into(),
            tags: Vec::new(),
            mastery_level: 0,
            last_reviewed: None,
        }
    }

    /// Blank row created by the glossary "add" action
    pub fn manual(topic: &str) -> Self {
        Self::new("", "", MANUAL_ENTRY_DEFINITION).with_tag(topic)
    }

    /// Add a tag unless it is already present
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag);
        self
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Tags joined the way the tabular export writes them
    pub fn joined_tags(&self) -> String {
        self.tags.join(";")
    }
}

/// A term as returned by prep material acquisition, before it gets an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTerm {
    pub english: String,
    pub chinese: String,
    pub definition: String,
}

impl RawTerm {
    /// Wrap into a stored term tagged with the session topic
    pub fn into_term(self, topic: &str) -> Term {
        Term::new(self.english, self.chinese, self.definition).with_tag(topic)
    }
}

/// Any number is accepted and clamped into `0..=MAX_MASTERY`; fractions round down
fn clamp_mastery<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let level = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if level.is_nan() {
        return Ok(0);
    }
    Ok(level.floor().clamp(0.0, MAX_MASTERY as f64) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_term_defaults() {
        let term = Term::manual("Solid-state batteries");
        assert!(term.english.is_empty());
        assert!(term.chinese.is_empty());
        assert_eq!(term.definition, MANUAL_ENTRY_DEFINITION);
        assert_eq!(term.tags, vec!["Solid-state batteries".to_string()]);
        assert_eq!(term.mastery_level, 0);
    }

    #[test]
    fn test_tags_behave_as_set() {
        let mut term = Term::new("anode", "阳极", "positive electrode").with_tag("EV");
        term.add_tag("EV");
        term.add_tag("Battery");
        assert_eq!(term.joined_tags(), "EV;Battery");
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let json = r#"{"id":"t1","english":"grid parity","chinese":"平价上网","definition":"d"}"#;
        let term: Term = serde_json::from_str(json).unwrap();
        assert!(term.tags.is_empty());
        assert_eq!(term.mastery_level, 0);
        assert!(term.last_reviewed.is_none());
    }

    #[test]
    fn test_mastery_is_clamped_on_load() {
        let json = r#"{"id":"t1","english":"a","chinese":"b","definition":"c","masteryLevel":9}"#;
        let term: Term = serde_json::from_str(json).unwrap();
        assert_eq!(term.mastery_level, MAX_MASTERY);
    }

    #[test]
    fn test_out_of_range_mastery_is_clamped() {
        let level = |raw: &str| {
            let json = format!(
                r#"{{"id":"t1","english":"a","chinese":"b","definition":"c","masteryLevel":{}}}"#,
                raw
            );
            serde_json::from_str::<Term>(&json).unwrap().mastery_level
        };
        assert_eq!(level("-1"), 0);
        assert_eq!(level("2.5"), 2);
        assert_eq!(level("1e9"), MAX_MASTERY);
        assert_eq!(level("null"), 0);
    }

    #[test]
    fn test_serialized_names_are_camel_case() {
        let term = Term::new("a", "b", "c");
        let value = serde_json::to_value(&term).unwrap();
        assert!(value.get("masteryLevel").is_some());
        assert!(value.get("lastReviewed").is_none());
    }

    #[test]
    fn test_raw_term_gets_fresh_id_and_topic_tag() {
        let raw = RawTerm {
            english: "curtailment".into(),
            chinese: "弃电".into(),
            definition: "Forced reduction of renewable output".into(),
        };
        let a = raw.clone().into_term("Grid");
        let b = raw.into_term("Grid");
        assert_ne!(a.id, b.id);
        assert_eq!(a.tags, vec!["Grid".to_string()]);
        assert_eq!(a.mastery_level, 0);
    }
}
