use serde::{Deserialize, Serialize};

use super::term::{RawTerm, Term};

/// Briefing and raw glossary returned for a topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepMaterial {
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub terms: Vec<RawTerm>,
}

impl PrepMaterial {
    pub fn new(summary: Vec<String>, terms: Vec<RawTerm>) -> Self {
        Self { summary, terms }
    }

    /// Give every raw term a fresh id and the topic as its tag
    pub fn into_parts(self, topic: &str) -> (Vec<String>, Vec<Term>) {
        let terms = self.terms.into_iter().map(|t| t.into_term(topic)).collect();
        (self.summary, terms)
    }
}
