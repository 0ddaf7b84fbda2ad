//! Conversation storage — completed runs written as JSON documents.

mod conversation;

pub use conversation::{ConversationStore, StorageError};
