//! Chat file host
//!
//! Treats a JSON chat export on disk as the chat history:
//! - Size limit and UTF-8 validation on read (a UTF-8 BOM is tolerated)
//! - Atomic writes so an interrupted update never truncates the chat
//! - One timestamped backup before the first write of a session
//!
//! The file on disk is the source of truth: every call re-reads it.

use super::ChatHost;
use crate::chat::{MessageContent, RawMessage};
use crate::config::FileConfig;
use crate::error::{HostError, HostResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// On-disk chat document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatFile {
    /// Ordered chat history
    pub messages: Vec<RawMessage>,

    /// Chat metadata this tool does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Host backed by a JSON chat file
#[derive(Debug, Clone)]
pub struct ChatFileHost {
    path: PathBuf,
    config: FileConfig,
    backup_path: Option<PathBuf>,
}

impl ChatFileHost {
    /// Open a chat file, validating that it can be read
    pub async fn open(path: impl AsRef<Path>, config: &FileConfig) -> HostResult<Self> {
        let host = Self {
            path: path.as_ref().to_path_buf(),
            config: config.clone(),
            backup_path: None,
        };
        let chat = host.read_chat().await?;
        log::info!(
            "Opened {} ({} messages)",
            host.path.display(),
            chat.messages.len()
        );
        Ok(host)
    }

    /// Backup written during this session, if any
    #[cfg(test)]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    async fn read_chat(&self) -> HostResult<ChatFile> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| self.io_error(e))?;

        let size = metadata.len();
        if size > self.config.max_file_size {
            return Err(HostError::TooLarge {
                path: self.path.clone(),
                size,
                max_size: self.config.max_file_size,
            });
        }

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| self.io_error(e))?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
        let text = std::str::from_utf8(body).map_err(|e| HostError::Parse {
            path: self.path.clone(),
            reason: format!("not valid UTF-8: {}", e),
        })?;

        serde_json::from_str(text).map_err(|e| HostError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    async fn write_chat(&mut self, chat: &ChatFile) -> HostResult<()> {
        if self.config.create_backups && self.backup_path.is_none() {
            self.backup_path = Some(self.write_backup().await?);
        }

        let mut content = serde_json::to_string_pretty(chat).map_err(|e| HostError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        content.push('\n');

        self.replace_file(&content).await
    }

    /// Swap in new file content in one rename; the chat file is never half written
    async fn replace_file(&self, content: &str) -> HostResult<()> {
        let temp = self.sibling_path("tmp");
        let written = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.io_error(e));
        }
        Ok(())
    }

    async fn write_backup(&self) -> HostResult<PathBuf> {
        let backup = self.sibling_path("bak");
        tokio::fs::copy(&self.path, &backup)
            .await
            .map_err(|e| self.io_error(e))?;
        log::info!("Backed up chat to {}", backup.display());
        Ok(backup)
    }

    /// `<dir>/<file>.<timestamp>.<suffix>` next to the chat file
    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chat.json".to_string());
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
        self.path
            .with_file_name(format!("{}.{}.{}", filename, stamp, suffix))
    }

    fn io_error(&self, source: std::io::Error) -> HostError {
        HostError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ChatHost for ChatFileHost {
    async fn list_messages(&self) -> HostResult<Vec<RawMessage>> {
        self.read_chat()
            .await
            .map(|chat| chat.messages)
            .map_err(|e| HostError::SourceUnavailable(e.to_string()))
    }

    async fn get_message(&self, index: usize) -> HostResult<RawMessage> {
        let chat = self
            .read_chat()
            .await
            .map_err(|e| HostError::SourceUnavailable(e.to_string()))?;
        chat.messages
            .into_iter()
            .nth(index)
            .ok_or(HostError::MessageNotFound { index })
    }

    async fn update_message(&mut self, index: usize, content: MessageContent) -> HostResult<()> {
        let mut chat = self.read_chat().await?;
        let message = chat
            .messages
            .get_mut(index)
            .ok_or(HostError::MessageNotFound { index })?;
        message.set_content(content);

        self.write_chat(&chat)
            .await
            .map_err(|e| HostError::PersistenceFailure {
                index,
                reason: e.to_string(),
            })
    }

    async fn notify_content_changed(&mut self) -> HostResult<()> {
        log::debug!("Chat file {} changed on disk", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_backups() -> FileConfig {
        FileConfig {
            create_backups: false,
            ..Default::default()
        }
    }

    fn write_chat_file(dir: &Path, value: &Value) -> PathBuf {
        let path = dir.join("chat.json");
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_list_and_update_preserve_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chat_file(
            dir.path(),
            &json!({
                "title": "tavern night",
                "messages": [
                    {"role": "user", "content": "hello there"},
                    {"role": "assistant", "parts": [{"text": "hi"}, {"image": "a.png"}]}
                ]
            }),
        );

        let mut host = ChatFileHost::open(&path, &no_backups()).await.unwrap();
        assert_eq!(host.list_messages().await.unwrap().len(), 2);

        host.update_message(0, MessageContent::Plain("goodbye".to_string()))
            .await
            .unwrap();

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["title"], "tavern night");
        assert_eq!(saved["messages"][0]["content"], "goodbye");
        assert_eq!(saved["messages"][1]["parts"][1]["image"], "a.png");
        assert!(host.backup_path().is_none());
    }

    #[tokio::test]
    async fn test_non_text_messages_do_not_block_the_chat() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chat_file(
            dir.path(),
            &json!({
                "messages": [
                    {"role": "user", "content": "find the cat"},
                    {"role": "tool", "content": {"result": 1}},
                    {"role": "assistant", "parts": "not a list", "content": "cat again"}
                ]
            }),
        );

        let mut host = ChatFileHost::open(&path, &no_backups()).await.unwrap();
        let messages = host.list_messages().await.unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages[1].content_shape().is_none());

        host.update_message(2, MessageContent::Plain("dog again".to_string()))
            .await
            .unwrap();
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["messages"][1]["content"], json!({"result": 1}));
        assert_eq!(saved["messages"][2]["parts"], "not a list");
        assert_eq!(saved["messages"][2]["content"], "dog again");
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chat_file(dir.path(), &json!({"messages": [{"role": "user", "content": "a"}]}));

        let mut host = ChatFileHost::open(&path, &no_backups()).await.unwrap();
        host.update_message(0, MessageContent::Plain("b".to_string()))
            .await
            .unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("chat.json")]);
    }

    #[tokio::test]
    async fn test_bom_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"{"messages": [{"role": "user", "content": "x"}]}"#);
        std::fs::write(&path, bytes).unwrap();

        let host = ChatFileHost::open(&path, &no_backups()).await.unwrap();
        let message = host.get_message(0).await.unwrap();
        assert_eq!(message.content_text(), Some("x"));
    }

    #[tokio::test]
    async fn test_backup_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chat_file(
            dir.path(),
            &json!({"messages": [{"role": "user", "content": "a"}, {"role": "user", "content": "b"}]}),
        );

        let mut host = ChatFileHost::open(&path, &FileConfig::default()).await.unwrap();
        host.update_message(1, MessageContent::Plain("B".to_string()))
            .await
            .unwrap();
        let backup = host.backup_path().unwrap().to_path_buf();
        host.update_message(0, MessageContent::Plain("A".to_string()))
            .await
            .unwrap();

        assert_eq!(host.backup_path(), Some(backup.as_path()));
        let original: Value =
            serde_json::from_str(&std::fs::read_to_string(&backup).unwrap()).unwrap();
        assert_eq!(original["messages"][1]["content"], "b");
    }

    #[tokio::test]
    async fn test_missing_index_and_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chat_file(dir.path(), &json!({"messages": []}));

        let mut host = ChatFileHost::open(&path, &no_backups()).await.unwrap();
        let err = host
            .update_message(4, MessageContent::Plain(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::MessageNotFound { index: 4 }));

        let tiny = FileConfig {
            max_file_size: 2,
            ..no_backups()
        };
        let err = ChatFileHost::open(&path, &tiny).await.unwrap_err();
        assert!(matches!(err, HostError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        std::fs::write(&path, "not json").unwrap();

        let err = ChatFileHost::open(&path, &no_backups()).await.unwrap_err();
        assert!(matches!(err, HostError::Parse { .. }));
    }
}
