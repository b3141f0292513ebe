//! Tabular glossary export and import.
//!
//! Export output is UTF-8 with a leading byte-order mark so spreadsheet tools
//! pick the right encoding. Every field is quoted and embedded quotes are
//! doubled. Import accepts anything that export produces plus the usual
//! variations (no BOM, unquoted fields, CRLF line endings).

use super::error::{GlossaryError, GlossaryResult};
use crate::types::{Session, Term};

pub const BOM: char = '\u{FEFF}';
pub const HEADER: [&str; 4] = ["English", "Chinese", "Definition", "Topic"];

/// Render the terms of a session as a CSV document
pub fn export_csv(terms: &[Term]) -> String {
    let rows: Vec<String> = terms
        .iter()
        .map(|term| {
            [
                term.english.as_str(),
                term.chinese.as_str(),
                term.definition.as_str(),
                term.joined_tags().as_str(),
            ]
            .iter()
            .map(|field| quote(field))
            .collect::<Vec<_>>()
            .join(",")
        })
        .collect();

    format!("{}{}\n{}", BOM, HEADER.join(","), rows.join("\n"))
}

/// File name offered for a session's CSV export
pub fn csv_file_name(topic: &str) -> String {
    format!("{}_glossary.csv", file_stem(topic))
}

/// Replace each whitespace run with a single underscore
pub fn file_stem(topic: &str) -> String {
    topic.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Wrap a field in quotes, doubling any embedded quote
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One parsed CSV row
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub english: String,
    pub chinese: String,
    pub definition: String,
    pub tags: Vec<String>,
}

impl CsvRow {
    /// Build a fresh term, falling back to `topic` when the row has no tags
    pub fn into_term(self, topic: &str) -> Term {
        let mut term = Term::new(self.english, self.chinese, self.definition);
        if self.tags.is_empty() {
            term.add_tag(topic);
        }
        for tag in self.tags {
            term.add_tag(tag);
        }
        term
    }
}

/// Parse a CSV glossary produced by [`export_csv`] or a spreadsheet
pub fn import_csv(input: &str) -> GlossaryResult<Vec<CsvRow>> {
    let input = input.strip_prefix(BOM).unwrap_or(input);
    let mut records = parse_records(input)?.into_iter();

    let header = records.next().ok_or(GlossaryError::MissingHeader)?;
    let normalized: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    let expected: Vec<String> = HEADER[..3].iter().map(|h| h.to_lowercase()).collect();
    if normalized.len() < 3 || normalized[..3] != expected[..] {
        return Err(GlossaryError::BadHeader(header.join(",")));
    }

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() < 3 {
            return Err(GlossaryError::ShortRow {
                row: index + 1,
                found: record.len(),
                expected: 3,
            });
        }
        let mut fields = record.into_iter();
        let english = fields.next().unwrap_or_default();
        let chinese = fields.next().unwrap_or_default();
        let definition = fields.next().unwrap_or_default();
        let tags = fields
            .next()
            .map(|t| {
                t.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        rows.push(CsvRow {
            english,
            chinese,
            definition,
            tags,
        });
    }
    Ok(rows)
}

/// Append imported rows to the end of a session's glossary
pub fn merge_into(session: &mut Session, rows: Vec<CsvRow>) -> usize {
    let count = rows.len();
    if count == 0 {
        return 0;
    }
    let topic = session.topic.clone();
    session
        .terms
        .extend(rows.into_iter().map(|row| row.into_term(&topic)));
    session.touch();
    count
}

fn parse_records(input: &str) -> GlossaryResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut in_quotes = false;
    let mut quote_line = 0;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(GlossaryError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}
