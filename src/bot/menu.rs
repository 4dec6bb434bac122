//! The shared main menu: entry point, universal fallback target, and the
//! deferred "show the menu in a few seconds" transition.

use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{debug, warn};

use crate::bot::App;

const WELCOME: &str = "🎉 <b>Welcome!</b>\n\n\
🚀 <b>What I can do:</b>\n\
• Random fact — learn something surprising\n\
• Open chat — talk to the model about anything\n\
• Persona chat — talk to famous figures\n\
• Quiz — test your knowledge\n\
• Translator — between English and other languages\n\
• Voice chat — talk with your voice\n\n\
Pick a feature from the menu below:";

/// Delay before a deferred main-menu render (quiz/chat farewell screens).
pub const MENU_DELAY: Duration = Duration::from_secs(3);

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🎲 Random fact", "random_fact")],
        vec![InlineKeyboardButton::callback("🤖 Open chat", "gpt_interface")],
        vec![InlineKeyboardButton::callback("👥 Persona chat", "talk_interface")],
        vec![InlineKeyboardButton::callback("🧠 Quiz", "quiz_interface")],
        vec![InlineKeyboardButton::callback("🥸 Translator", "translate_interface")],
        vec![InlineKeyboardButton::callback("🎤 Voice chat", "start_voice_dialog")],
    ])
}

/// A single "back to main menu" row, shared by the selection screens.
pub fn back_row() -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback("🏠 Main menu", "main_menu")]
}

/// Render the main menu and reset the session. Every mode's finish control
/// and every global fallback lands here.
pub async fn render_main_menu(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    app.sessions.update(chat_id, |s| s.reset()).await;

    let image = app.config.asset("menu.png");
    match app
        .tg
        .show_screen(chat_id, image.as_deref(), WELCOME, main_menu_keyboard(), replace)
        .await
    {
        Ok(message_id) => {
            app.sessions
                .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
                .await;
        }
        Err(e) => warn!("Failed to render main menu for chat {chat_id}: {e}"),
    }
}

/// Schedule a main-menu render after `delay`. `scheduled_at` is the session
/// epoch observed by the event that asked for the transition; if any newer
/// event arrives in the meantime the epoch moves on and the render is
/// cancelled.
pub fn schedule_main_menu(
    app: Arc<App>,
    chat_id: i64,
    replace: Option<i32>,
    delay: Duration,
    scheduled_at: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        if app.sessions.epoch(chat_id).await != scheduled_at {
            debug!("Deferred menu for chat {chat_id} cancelled by a newer event");
            return;
        }
        render_main_menu(&app, chat_id, replace).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_lists_every_mode() {
        let keyboard = main_menu_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 6);

        let payloads: Vec<_> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(d) => Some(d.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            payloads,
            vec![
                "random_fact",
                "gpt_interface",
                "talk_interface",
                "quiz_interface",
                "translate_interface",
                "start_voice_dialog",
            ]
        );
    }
}
