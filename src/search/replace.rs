//! Message rewriting
//!
//! Applies a compiled pattern to a message's content while keeping its
//! structural shape: flat text stays flat, and in multi-part content only
//! text-bearing parts are rewritten, each on its own.

use super::find::Pattern;
use super::Document;
use crate::chat::{MessageContent, MessagePart};
use crate::error::HostResult;
use crate::host::ChatHost;
use std::collections::BTreeSet;

/// Outcome of a batch replace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Messages rewritten (or already free of text)
    pub succeeded: usize,
    /// Messages whose read or update failed
    pub failed: usize,
}

/// Rewrite every match in `content`, preserving part order and count
pub fn rewrite_content(
    content: &MessageContent,
    pattern: &Pattern,
    replacement: &str,
) -> MessageContent {
    match content {
        MessageContent::Plain(text) => {
            MessageContent::Plain(pattern.replace_all(text, replacement))
        }
        MessageContent::Parts(parts) => MessageContent::Parts(
            parts
                .iter()
                .map(|part| match part.text_payload() {
                    Some(text) => part.with_text(pattern.replace_all(text, replacement)),
                    None => part.clone(),
                })
                .collect(),
        ),
    }
}

/// Distinct message indices of a result set, highest first
pub fn descending_indices(documents: &[Document]) -> Vec<usize> {
    let unique: BTreeSet<usize> = documents.iter().map(|d| d.message_index).collect();
    unique.into_iter().rev().collect()
}

/// Re-read one message from the host, rewrite it and write it back
pub async fn rewrite_message<H: ChatHost + ?Sized>(
    host: &mut H,
    index: usize,
    pattern: &Pattern,
    replacement: &str,
) -> HostResult<bool> {
    let message = host.get_message(index).await?;
    let Some(content) = message.content_shape() else {
        log::debug!("Message #{} has no text left, skipping", index);
        return Ok(false);
    };

    let rewritten = rewrite_content(&content, pattern, replacement);
    host.update_message(index, rewritten).await?;
    Ok(true)
}

/// Rewrite every message in the result set.
///
/// Updates go out one at a time in descending index order, each awaited
/// before the next, so a host that shifts messages on update cannot
/// invalidate indices still queued. A failing message is counted and the
/// batch moves on.
pub async fn rewrite_all<H: ChatHost + ?Sized>(
    host: &mut H,
    documents: &[Document],
    pattern: &Pattern,
    replacement: &str,
) -> ReplaceSummary {
    let mut summary = ReplaceSummary::default();

    for index in descending_indices(documents) {
        log::debug!("Rewriting message #{}", index);
        match rewrite_message(host, index, pattern, replacement).await {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                log::warn!("Replace failed for message #{}: {}", index, e);
                summary.failed += 1;
            }
        }
    }

    log::info!(
        "Replace all finished: {} succeeded, {} failed",
        summary.succeeded,
        summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::RawMessage;
    use crate::host::MemoryHost;
    use crate::search::find::FindOptions;
    use serde_json::json;

    fn literal(query: &str) -> Pattern {
        Pattern::compile(query, &FindOptions::default()).unwrap()
    }

    fn document(message_index: usize) -> Document {
        Document {
            message_index,
            role: "user".to_string(),
            display_name: "user".to_string(),
            content: MessageContent::Plain(String::new()),
            text: String::new(),
            matches: Vec::new(),
        }
    }

    #[test]
    fn test_rewrite_parts_preserves_structure() {
        let other: MessagePart = serde_json::from_value(json!({"other": true})).unwrap();
        let content = MessageContent::Parts(vec![
            MessagePart::text("foo"),
            other.clone(),
            MessagePart::text("bar"),
        ]);

        let rewritten = rewrite_content(&content, &literal("o"), "0");
        assert_eq!(
            rewritten,
            MessageContent::Parts(vec![MessagePart::text("f00"), other, MessagePart::text("bar")])
        );
    }

    #[test]
    fn test_rewrite_parts_never_spans_part_boundaries() {
        let content = MessageContent::Parts(vec![MessagePart::text("ab"), MessagePart::text("cd")]);
        // "b\nc" exists only in the joined display text
        let pattern = Pattern::compile(
            r"b\nc",
            &FindOptions {
                use_regex: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rewrite_content(&content, &pattern, "X"), content);
    }

    #[test]
    fn test_rewrite_plain_replaces_every_match() {
        let content = MessageContent::Plain("foo bar foo baz foo".to_string());
        assert_eq!(
            rewrite_content(&content, &literal("foo"), "qux"),
            MessageContent::Plain("qux bar qux baz qux".to_string())
        );
    }

    #[test]
    fn test_descending_indices_dedupes() {
        let docs = vec![document(2), document(5), document(1), document(5)];
        assert_eq!(descending_indices(&docs), vec![5, 2, 1]);
    }

    #[tokio::test]
    async fn test_rewrite_all_issues_updates_in_descending_order() {
        let messages = (0..6)
            .map(|i| RawMessage::plain("user", format!("cat {}", i)))
            .collect();
        let mut host = MemoryHost::new(messages);
        let docs = vec![document(2), document(5), document(1)];

        let summary = rewrite_all(&mut host, &docs, &literal("cat"), "dog").await;

        assert_eq!(host.update_log(), &[5, 2, 1]);
        assert_eq!(summary, ReplaceSummary { succeeded: 3, failed: 0 });
        assert_eq!(host.messages()[5].content_text(), Some("dog 5"));
        assert_eq!(host.messages()[0].content_text(), Some("cat 0"));
    }

    #[tokio::test]
    async fn test_rewrite_all_continues_after_failure() {
        let messages = (0..6)
            .map(|i| RawMessage::plain("user", format!("cat {}", i)))
            .collect();
        let mut host = MemoryHost::new(messages);
        host.fail_updates_for(5);
        let docs = vec![document(2), document(5), document(1)];

        let summary = rewrite_all(&mut host, &docs, &literal("cat"), "dog").await;

        assert_eq!(host.update_log(), &[5, 2, 1]);
        assert_eq!(summary, ReplaceSummary { succeeded: 2, failed: 1 });
        assert_eq!(host.messages()[2].content_text(), Some("dog 2"));
        assert_eq!(host.messages()[5].content_text(), Some("cat 5"));
    }

    #[tokio::test]
    async fn test_rewrite_all_counts_vanished_messages_as_failures() {
        let mut host = MemoryHost::new(vec![RawMessage::plain("user", "cat")]);
        let docs = vec![document(0), document(3)];

        let summary = rewrite_all(&mut host, &docs, &literal("cat"), "dog").await;

        assert_eq!(summary, ReplaceSummary { succeeded: 1, failed: 1 });
        assert_eq!(host.update_log(), &[0]);
    }

    #[tokio::test]
    async fn test_rewrite_uses_current_host_content() {
        let mut host = MemoryHost::new(vec![RawMessage::plain("user", "cat nap")]);
        host.update_message(0, MessageContent::Plain("cat cat".to_string()))
            .await
            .unwrap();

        rewrite_message(&mut host, 0, &literal("cat"), "dog").await.unwrap();
        assert_eq!(host.messages()[0].content_text(), Some("dog dog"));
    }
}
