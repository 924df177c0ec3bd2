//! Chat history host
//!
//! The host owns the chat history. The search engine only reads messages
//! through it and writes rewritten content back through it:
//! - `list_messages` snapshots the whole history for a search
//! - `get_message` re-reads one message right before it is rewritten
//! - `update_message` persists rewritten content
//! - `notify_content_changed` asks the host to refresh whatever shows the chat

mod file;
mod memory;

pub use file::ChatFileHost;
pub use memory::MemoryHost;

use crate::chat::{MessageContent, RawMessage};
use crate::error::HostResult;
use async_trait::async_trait;

/// Read/write access to an ordered chat history
#[async_trait]
pub trait ChatHost: Send {
    /// Full chat history snapshot, in order
    async fn list_messages(&self) -> HostResult<Vec<RawMessage>>;

    /// Current state of one message
    async fn get_message(&self, index: usize) -> HostResult<RawMessage>;

    /// Persist new content for one message
    async fn update_message(&mut self, index: usize, content: MessageContent) -> HostResult<()>;

    /// Refresh any displayed view after one or more updates
    async fn notify_content_changed(&mut self) -> HostResult<()>;
}
