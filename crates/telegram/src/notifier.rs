use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{info, warn};

use common::Notifier;

/// Telegram rejects messages longer than this many UTF-16 units; staying
/// under it in chars is enough for the ASCII we send.
const MAX_MESSAGE_LEN: usize = 4000;

/// Delivers pass results and alerts to every configured chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_ids: &[i64]) -> Self {
        Self {
            bot,
            chat_ids: chat_ids.iter().copied().map(ChatId).collect(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        let parts = split_message(text, MAX_MESSAGE_LEN);
        let mut delivered = 0;
        for &chat_id in &self.chat_ids {
            if send_parts(&self.bot, chat_id, &parts).await {
                delivered += 1;
            }
        }
        delivery_log(delivered, self.chat_ids.len(), parts.len());
    }
}

/// Send every part to one chat, stopping at the first failure.
async fn send_parts(bot: &Bot, chat_id: ChatId, parts: &[String]) -> bool {
    for part in parts {
        if let Err(e) = bot.send_message(chat_id, part.as_str()).await {
            warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram message");
            return false;
        }
    }
    true
}

/// Returns whether every chat received the whole message.
fn delivery_log(delivered: usize, chats: usize, parts: usize) -> bool {
    if delivered == chats {
        info!(chats, parts, "Notification delivered");
        true
    } else {
        warn!(delivered, chats, parts, "Notification not delivered to every chat");
        false
    }
}

/// Break `text` into pieces of at most `max` chars, preferring line breaks and
/// then list separators so symbol names are never cut in half.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max {
        let window_end = rest
            .char_indices()
            .nth(max)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];

        let (cut, skip) = if let Some(i) = window.rfind('\n') {
            (i, 1)
        } else if let Some(i) = window.rfind(", ") {
            (i + 1, 1)
        } else {
            (window_end, 0)
        };
        let (cut, skip) = if cut == 0 { (window_end, 0) } else { (cut, skip) };

        parts.push(rest[..cut].trim_end().to_string());
        rest = &rest[(cut + skip).min(rest.len())..];
    }
    if !rest.is_empty() || parts.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_delivery_is_not_reported_as_sent() {
        assert!(delivery_log(2, 2, 1));
        assert!(!delivery_log(0, 2, 1));
        assert!(!delivery_log(1, 2, 3));
    }

    #[test]
    fn short_message_is_untouched() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn splits_on_list_separator() {
        let parts = split_message("AAAUSDT, BBBUSDT, CCCUSDT", 18);
        assert_eq!(parts, vec!["AAAUSDT, BBBUSDT,", "CCCUSDT"]);
    }

    #[test]
    fn prefers_line_breaks() {
        let parts = split_message("first line\nsecond, line", 15);
        assert_eq!(parts, vec!["first line", "second, line"]);
    }

    #[test]
    fn hard_cut_without_separators() {
        let parts = split_message("abcdefghij", 4);
        assert_eq!(parts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn every_part_respects_limit() {
        let symbols: Vec<String> = (0..2000).map(|i| format!("TOK{i}USDT")).collect();
        let text = format!("Tokens meeting the needed conditions (2000): {}", symbols.join(", "));
        let parts = split_message(&text, MAX_MESSAGE_LEN);
        assert!(parts.len() > 1);
        assert!(parts.iter().all(|p| p.chars().count() <= MAX_MESSAGE_LEN));
        let rejoined = parts.join(" ");
        assert_eq!(rejoined, text);
    }
}
