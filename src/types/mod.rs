//! Core data types for conversations and the engine wire protocol.

mod conversation;
mod envelope;
mod turn;

pub use conversation::Conversation;
pub use envelope::{
    Analysis, ChatRequest, ChatResponse, HistoryEntry, KnowledgeResponse, RecordSummary,
    UploadResponse,
};
pub use turn::{Turn, TurnRole};
