//! Editor page state and the driver that connects it to the job service.

use thiserror::Error;

use jobs::JobError;
use timeline::TimelineError;

pub mod chat;
pub mod config;
pub mod panels;
mod session;
pub use session::*;
mod editor;
pub use editor::*;
mod token;
pub use token::*;

pub use chat::{ChatLog, ChatMessage, ChatResponder, LocalResponder, Role};
pub use config::EditorConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no video loaded")]
    NoVideo,
    #[error("no clip selected")]
    NoSelection,
    #[error("no job yet: upload a video first")]
    NoJob,
    #[error("an edit is already in progress")]
    Busy,
    #[error("message is empty")]
    EmptyMessage,
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}
