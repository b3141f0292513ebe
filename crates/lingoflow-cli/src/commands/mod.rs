pub mod chat;
pub mod config;
pub mod drill;
pub mod sessions;
pub mod terms;
