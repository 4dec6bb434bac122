//! Random fact mode. Stateless: every trigger is one completion call.

use std::sync::Arc;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::bot::telegram::html_escape;
use crate::bot::App;

fn fact_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🎲 Another fact", "random_more")],
        vec![InlineKeyboardButton::callback("🏠 Done", "random_finish")],
    ])
}

/// Fetch and show one fact. `replace` is the pressed message for callback
/// triggers; commands get a fresh message.
pub async fn entry(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    info!("Fact requested by chat {chat_id}");
    app.sessions.update(chat_id, |s| s.reset()).await;

    let placeholder = "🎲 Generating an interesting fact... ⏳";
    let shown = match replace {
        Some(message_id) => app.tg.replace_screen(chat_id, message_id, placeholder, None).await,
        None => app.tg.send_message(chat_id, placeholder, None).await,
    };
    let Ok(message_id) = shown else {
        return;
    };

    let (text, keyboard) = match app.openai.random_fact().await {
        Ok(fact) => (
            format!("🧠 <b>Did you know?</b>\n\n{}", html_escape(&fact)),
            fact_keyboard(),
        ),
        Err(e) => {
            warn!("Failed to fetch a fact: {e}");
            (
                "🤔 Couldn't fetch a fact right now. Please try again!".to_string(),
                fact_keyboard(),
            )
        }
    };

    if let Err(e) = app
        .tg
        .edit_message(chat_id, message_id, &text, Some(keyboard))
        .await
    {
        warn!("Failed to show fact to chat {chat_id}: {e}");
    } else {
        app.sessions
            .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
            .await;
    }
}
