//! Translator mode. Structurally the persona flow with the language
//! registry: pick a target language, then every message comes back as a
//! translation.

use std::sync::Arc;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::bot::registry;
use crate::bot::session::{Mode, TranslateState};
use crate::bot::telegram::html_escape;
use crate::bot::{menu, App};

/// Translations can run longer than persona small talk.
const REPLY_MAX_TOKENS: u32 = 300;

const SELECT_TEXT: &str = "🌍 <b>Translator</b>\n\n\
Pick a language to translate to:\n\n\
I can translate in both directions!";

fn selection_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = registry::LANGUAGES
        .iter()
        .map(|l| {
            vec![InlineKeyboardButton::callback(
                format!("{} {}", l.emoji, l.name),
                format!("languages_{}", l.key),
            )]
        })
        .collect();
    rows.push(menu::back_row());
    InlineKeyboardMarkup::new(rows)
}

fn translate_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🔄 Change language", "change_languages")],
        vec![InlineKeyboardButton::callback("🏠 Back to menu", "finish_translate")],
    ])
}

/// Show the language selection menu.
pub async fn entry(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    info!("Language selection for chat {chat_id}");
    app.sessions
        .update(chat_id, |s| s.mode = Mode::Translate(TranslateState::Choosing))
        .await;

    let image = app.config.asset("translate.png");
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
        Err(e) => warn!("Failed to show language menu: {e}"),
    }
}

/// A target language was picked from the menu.
pub async fn select(app: &Arc<App>, chat_id: i64, message_id: i32, key: &str) {
    let Some(language) = registry::language(key) else {
        warn!("Unknown language key: {key}");
        let _ = app
            .tg
            .replace_screen(
                chat_id,
                message_id,
                "❌ That language isn't available. Pick one from the list:",
                Some(selection_keyboard()),
            )
            .await;
        return;
    };

    info!("Chat {chat_id} picked language {key}");
    app.sessions
        .update(chat_id, |s| {
            s.mode = Mode::Translate(TranslateState::Translating { key: key.to_string() })
        })
        .await;

    let text = format!(
        "{} <b>{}</b>\n\n\
📝 Now write any text and I'll translate it!\n\n\
I'll detect the direction automatically.",
        language.emoji, language.name
    );
    let _ = app
        .tg
        .replace_screen(chat_id, message_id, &text, Some(translate_keyboard()))
        .await;
}

/// Translate one message.
pub async fn exchange(app: &Arc<App>, chat_id: i64, key: &str, text: &str) {
    let Some(language) = registry::language(key) else {
        warn!("Language key {key} no longer resolves, returning chat {chat_id} to selection");
        entry(app, chat_id, None).await;
        return;
    };

    app.tg.typing(chat_id).await;
    let Ok(placeholder) = app
        .tg
        .send_message(chat_id, "🔄 Translating... ⏳", None)
        .await
    else {
        return;
    };

    let styled = app
        .openai
        .styled_reply(text, language.prompt, REPLY_MAX_TOKENS)
        .await;

    let reply = match styled {
        Ok(translation) => format!(
            "{} <b>Translation:</b>\n\n{}",
            language.emoji,
            html_escape(&translation)
        ),
        Err(e) => {
            warn!("Translation failed for chat {chat_id}: {e}");
            "😔 Sorry, the translation failed. Please try again.".to_string()
        }
    };

    if let Err(e) = app
        .tg
        .edit_message(chat_id, placeholder, &reply, Some(translate_keyboard()))
        .await
    {
        warn!("Failed to show translation: {e}");
    } else {
        app.sessions
            .with_session(chat_id, |s| s.menu_message_id = Some(placeholder))
            .await;
    }
}
