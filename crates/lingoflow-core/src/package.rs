//! Full-session JSON package used for backup and restore.

use crate::glossary::csv::file_stem;
use crate::types::Session;

/// Pretty-printed JSON document holding the whole session
pub fn export_package(session: &Session) -> serde_json::Result<String> {
    serde_json::to_string_pretty(session)
}

/// Parse a package produced by [`export_package`]
pub fn import_package(json: &str) -> serde_json::Result<Session> {
    let json = json.strip_prefix('\u{FEFF}').unwrap_or(json);
    serde_json::from_str(json)
}

/// File name offered for a session's package export
pub fn package_file_name(topic: &str) -> String {
    format!("{}_package.json", file_stem(topic))
}
