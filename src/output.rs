use crate::api::RawMessage;

/// One message ready for the output file, with display defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub timestamp: String,
    pub author_name: String,
    pub author_discriminator: String,
    pub content: String,
}

impl MessageRecord {
    /// Extract a record from a raw API message.
    ///
    /// Absent fields fall back to sentinel values; embedded newlines in the
    /// content are replaced with spaces so every message stays on one line.
    pub fn from_raw(raw: &RawMessage) -> Self {
        let author = raw.author.as_ref();
        Self {
            timestamp: raw
                .timestamp
                .clone()
                .unwrap_or_else(|| "UnknownTimestamp".to_string()),
            author_name: author
                .and_then(|a| a.username.clone())
                .unwrap_or_else(|| "UnknownUser".to_string()),
            author_discriminator: author
                .and_then(|a| a.discriminator.clone())
                .unwrap_or_else(|| "0000".to_string()),
            content: raw.content.clone().unwrap_or_default().replace('\n', " "),
        }
    }

    /// Format as `[<timestamp>] <username>#<discriminator>: <content>`.
    pub fn format_line(&self) -> String {
        format!(
            "[{}] {}#{}: {}",
            self.timestamp, self.author_name, self.author_discriminator, self.content
        )
    }
}
