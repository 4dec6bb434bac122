//! Telegram client using teloxide.
//!
//! Thin wrapper over the Bot API calls the mode handlers need: sending and
//! editing HTML-formatted messages with inline keyboards, menu screens with
//! an optional image, voice clips in both directions.

use std::path::Path;

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use tracing::{info, warn};

/// Escape text for interpolation into HTML-formatted messages. Model output
/// is untrusted markup as far as Telegram is concerned.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send an HTML message, optionally with an inline keyboard.
    /// Returns the new message id.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, String> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(markup) = keyboard {
            request = request.reply_markup(markup);
        }

        request.await.map(|msg| msg.id.0).map_err(|e| {
            let msg = format!("Failed to send: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Edit a previously sent message in place.
    pub async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), String> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(markup) = keyboard {
            request = request.reply_markup(markup);
        }

        request.await.map(|_| ()).map_err(|e| {
            let msg = format!("Failed to edit message {message_id}: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Delete a message. Stale menus are deleted best-effort; the caller
    /// decides whether failure matters.
    pub async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), String> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to delete message {message_id}: {e}"))
    }

    /// Send a photo from disk with an HTML caption and keyboard.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, String> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption)
            .parse_mode(ParseMode::Html);

        if let Some(markup) = keyboard {
            request = request.reply_markup(markup);
        }

        request.await.map(|msg| msg.id.0).map_err(|e| {
            let msg = format!("Failed to send photo: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Show a screen: an image with caption when the asset exists, a plain
    /// message otherwise. When `replace` is given the old message is edited
    /// in place (or deleted first, for photo screens, which cannot be edited
    /// from a text message). Returns the id of the message now on screen.
    pub async fn show_screen(
        &self,
        chat_id: i64,
        image: Option<&Path>,
        text: &str,
        keyboard: InlineKeyboardMarkup,
        replace: Option<i32>,
    ) -> Result<i32, String> {
        if let Some(path) = image {
            if let Some(old) = replace {
                let _ = self.delete_message(chat_id, old).await;
            }
            match self.send_photo(chat_id, path, text, Some(keyboard.clone())).await {
                Ok(id) => return Ok(id),
                Err(e) => warn!("Falling back to text screen: {e}"),
            }
        }

        if let Some(old) = replace {
            if self.edit_message(chat_id, old, text, Some(keyboard.clone())).await.is_ok() {
                return Ok(old);
            }
        }

        self.send_message(chat_id, text, Some(keyboard)).await
    }

    /// Replace a screen in response to a button press: edit in place when
    /// possible, otherwise (photo screens can't become text) delete and send
    /// anew. Returns the id of the message now on screen.
    pub async fn replace_screen(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, String> {
        if self
            .edit_message(chat_id, message_id, text, keyboard.clone())
            .await
            .is_ok()
        {
            return Ok(message_id);
        }
        let _ = self.delete_message(chat_id, message_id).await;
        self.send_message(chat_id, text, keyboard).await
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn ack_callback(&self, q: &CallbackQuery) {
        if let Err(e) = self.bot.answer_callback_query(q.id.clone()).await {
            warn!("Failed to answer callback query: {e}");
        }
    }

    /// Show the typing indicator.
    pub async fn typing(&self, chat_id: i64) {
        if let Err(e) = self
            .bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
        {
            warn!("Failed to send chat action: {e}");
        }
    }

    /// Send a voice message from bytes (OGG Opus format).
    pub async fn send_voice(&self, chat_id: i64, voice_data: Vec<u8>) -> Result<i32, String> {
        info!("🔊 Sending voice to chat {} ({} bytes)", chat_id, voice_data.len());

        let input_file = InputFile::memory(voice_data).file_name("voice.ogg");
        self.bot
            .send_voice(ChatId(chat_id), input_file)
            .await
            .map(|msg| msg.id.0)
            .map_err(|e| {
                let msg = format!("Failed to send voice: {e}");
                warn!("{}", msg);
                msg
            })
    }

    /// Download a voice clip by file id. Returns the raw OGG bytes.
    pub async fn download_voice(&self, file_id: teloxide::types::FileId) -> Result<Vec<u8>, String> {
        let file = self
            .bot
            .get_file(file_id)
            .await
            .map_err(|e| format!("Failed to get file info: {e}"))?;

        let mut data = Vec::new();
        self.bot
            .download_file(&file.path, &mut data)
            .await
            .map_err(|e| format!("Failed to download file: {e}"))?;

        info!("📥 Downloaded voice clip ({} bytes)", data.len());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("1 < 2 > 0"), "1 &lt; 2 &gt; 0");
    }
}
