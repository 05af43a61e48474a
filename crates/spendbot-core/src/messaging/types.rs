use crate::domain::ChatId;

/// Inbound text message, already stripped of transport-specific fields.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub text: String,
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}

impl MessagingCapabilities {
    /// Cut `text` to the transport limit on a char boundary.
    ///
    /// `max_message_len` is in UTF-16 code units, which is how Telegram counts.
    pub fn fit(&self, text: &str) -> String {
        if text.encode_utf16().count() <= self.max_message_len {
            return text.to_string();
        }
        let budget = self.max_message_len.saturating_sub(3);
        let mut used = 0;
        let mut out = String::new();
        for c in text.chars() {
            used += c.len_utf16();
            if used > budget {
                break;
            }
            out.push(c);
        }
        out.push_str("...");
        out
    }
}
