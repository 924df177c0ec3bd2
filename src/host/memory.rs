//! In-memory chat host
//!
//! Backs `--dry-run` and the engine tests. Records the order of update calls
//! and can be told to fail updates for specific indices.

use super::ChatHost;
use crate::chat::{MessageContent, RawMessage};
use crate::error::{HostError, HostResult};
use async_trait::async_trait;
use std::collections::HashSet;

/// Chat history held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    messages: Vec<RawMessage>,
    failing_updates: HashSet<usize>,
    failing_listing: bool,
    update_log: Vec<usize>,
    refresh_count: usize,
}

impl MemoryHost {
    /// Create a host over the given messages
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Make every update of `index` fail
    #[cfg(test)]
    pub fn fail_updates_for(&mut self, index: usize) {
        self.failing_updates.insert(index);
    }

    /// Make `list_messages` fail until switched back off
    #[cfg(test)]
    pub fn fail_listing(&mut self, fail: bool) {
        self.failing_listing = fail;
    }

    /// Current messages
    #[cfg(test)]
    pub fn messages(&self) -> &[RawMessage] {
        &self.messages
    }

    /// Indices passed to `update_message`, in call order (failed calls included)
    #[cfg(test)]
    pub fn update_log(&self) -> &[usize] {
        &self.update_log
    }

    /// How many times a refresh was requested
    #[cfg(test)]
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }
}

#[async_trait]
impl ChatHost for MemoryHost {
    async fn list_messages(&self) -> HostResult<Vec<RawMessage>> {
        if self.failing_listing {
            return Err(HostError::SourceUnavailable("listing rejected".to_string()));
        }
        Ok(self.messages.clone())
    }

    async fn get_message(&self, index: usize) -> HostResult<RawMessage> {
        self.messages
            .get(index)
            .cloned()
            .ok_or(HostError::MessageNotFound { index })
    }

    async fn update_message(&mut self, index: usize, content: MessageContent) -> HostResult<()> {
        self.update_log.push(index);
        log::debug!("In-memory update #{} ({} so far)", index, self.update_log.len());

        if self.failing_updates.contains(&index) {
            return Err(HostError::PersistenceFailure {
                index,
                reason: "update rejected".to_string(),
            });
        }

        let message = self
            .messages
            .get_mut(index)
            .ok_or(HostError::MessageNotFound { index })?;
        message.set_content(content);
        Ok(())
    }

    async fn notify_content_changed(&mut self) -> HostResult<()> {
        self.refresh_count += 1;
        log::debug!("In-memory chat refreshed ({} times)", self.refresh_count);
        Ok(())
    }
}
