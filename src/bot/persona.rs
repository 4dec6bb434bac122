//! Persona chat mode: pick a figure from the registry, then talk to them.
//! Each exchange sends only the current message under the persona's system
//! prompt; no history is carried.

use std::sync::Arc;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::bot::registry::{self, Entry};
use crate::bot::session::{Mode, PersonaState};
use crate::bot::telegram::html_escape;
use crate::bot::{menu, App};

/// Short in-character replies.
const REPLY_MAX_TOKENS: u32 = 120;

const SELECT_TEXT: &str = "👥 <b>Persona chat</b>\n\n\
Pick who you want to talk to:";

fn selection_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = registry::PERSONAS
        .iter()
        .map(|p| {
            vec![InlineKeyboardButton::callback(
                format!("{} {}", p.emoji, p.name),
                format!("personality_{}", p.key),
            )]
        })
        .collect();
    rows.push(menu::back_row());
    InlineKeyboardMarkup::new(rows)
}

fn talk_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🔄 Change persona", "change_personality")],
        vec![InlineKeyboardButton::callback("🏠 Back to menu", "finish_talk")],
    ])
}

/// Show the persona selection menu.
pub async fn entry(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    info!("Persona selection for chat {chat_id}");
    app.sessions
        .update(chat_id, |s| s.mode = Mode::Persona(PersonaState::Choosing))
        .await;

    let image = app.config.asset("personality.png");
    match app
        .tg
        .show_screen(chat_id, image.as_deref(), SELECT_TEXT, selection_keyboard(), replace)
        .await
    {
        Ok(message_id) => {
            app.sessions
                .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
                .await;
        }
        Err(e) => warn!("Failed to show persona menu: {e}"),
    }
}

/// A persona was picked from the menu.
pub async fn select(app: &Arc<App>, chat_id: i64, message_id: i32, key: &str) {
    let Some(persona) = registry::persona(key) else {
        warn!("Unknown persona key: {key}");
        let _ = app
            .tg
            .replace_screen(
                chat_id,
                message_id,
                "❌ That persona doesn't exist. Pick one from the list:",
                Some(selection_keyboard()),
            )
            .await;
        return;
    };

    info!("Chat {chat_id} picked persona {key}");
    app.sessions
        .update(chat_id, |s| {
            s.mode = Mode::Persona(PersonaState::Talking { key: key.to_string() })
        })
        .await;

    let text = format!(
        "🎭 You are now talking to {} <b>{}</b>\n\n\
Write any message and they will answer in character!",
        persona.emoji, persona.name
    );
    let _ = app
        .tg
        .replace_screen(chat_id, message_id, &text, Some(talk_keyboard()))
        .await;
}

/// One in-character exchange.
pub async fn exchange(app: &Arc<App>, chat_id: i64, key: &str, text: &str) {
    let Some(persona) = registry::persona(key) else {
        // Selection went missing (registry changed, stale session): recover
        // by sending the user back to the selection screen.
        warn!("Persona key {key} no longer resolves, returning chat {chat_id} to selection");
        entry(app, chat_id, None).await;
        return;
    };

    app.tg.typing(chat_id).await;
    let Ok(placeholder) = app
        .tg
        .send_message(chat_id, "🤔 Thinking... ⏳", None)
        .await
    else {
        return;
    };

    let styled = app
        .openai
        .styled_reply(text, persona.prompt, REPLY_MAX_TOKENS)
        .await;

    let (reply, keyboard) = match styled {
        Ok(answer) => (render_reply(persona, &answer), talk_keyboard()),
        Err(e) => {
            warn!("Persona completion failed for chat {chat_id}: {e}");
            (
                "😔 Sorry, something went wrong while answering. Please try again.".to_string(),
                talk_keyboard(),
            )
        }
    };

    if let Err(e) = app
        .tg
        .edit_message(chat_id, placeholder, &reply, Some(keyboard))
        .await
    {
        warn!("Failed to show persona reply: {e}");
    } else {
        app.sessions
            .with_session(chat_id, |s| s.menu_message_id = Some(placeholder))
            .await;
    }
}

fn render_reply(persona: &Entry, answer: &str) -> String {
    format!(
        "{} <b>{} says:</b>\n\n{}",
        persona.emoji,
        persona.name,
        html_escape(answer)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_keyboard_lists_every_persona_plus_back_row() {
        let keyboard = selection_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), registry::PERSONAS.len() + 1);
    }

    #[test]
    fn test_render_reply_escapes_model_output() {
        let persona = registry::persona("einstein").unwrap();
        let rendered = render_reply(persona, "E = mc^2 < infinity");
        assert!(rendered.contains("&lt; infinity"));
        assert!(rendered.contains("Albert Einstein"));
    }
}
