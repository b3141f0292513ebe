pub mod message;
pub mod prep;
pub mod session;
pub mod term;

pub use message::{ChatMessage, ChatRole, MessageId};
pub use prep::PrepMaterial;
pub use session::{Session, SessionId};
pub use term::{RawTerm, Term, TermId, MANUAL_ENTRY_DEFINITION, MAX_MASTERY};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to the millisecond precision used on disk,
/// so a value survives a save/load cycle unchanged.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
