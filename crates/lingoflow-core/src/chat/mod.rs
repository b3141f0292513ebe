pub mod chunk;
pub mod request;
pub mod response;

pub use chunk::{ChatChunk, FinishReason};
pub use request::{ChatOptions, ChatRequest, ResponseFormat};
pub use response::{ChatResponse, ChatUsage};
