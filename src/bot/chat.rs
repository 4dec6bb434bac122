//! Open chat mode: a plain dialog with the model, full history resent on
//! every exchange.

use std::sync::Arc;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::bot::session::Mode;
use crate::bot::telegram::html_escape;
use crate::bot::{menu, App};
use crate::openai::ChatTurn;

const INSTRUCTIONS: &str = "🤖 <b>Open chat</b>\n\n\
Write any question or message and I'll pass it to the model!\n\n\
💡 <b>For example:</b>\n\
• Explain quantum physics in simple words\n\
• Write a short story about a cat\n\
• How do I cook pasta carbonara?\n\
• Translate a phrase into English";

fn chat_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("💬 New dialog", "gpt_continue")],
        vec![InlineKeyboardButton::callback("🏠 Back to menu", "gpt_finish")],
    ])
}

/// Enter the mode (or restart it via "New dialog"). History is always
/// cleared here; a fresh dialog means a fresh dialog.
pub async fn entry(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    info!("▶️ Open chat started for chat {chat_id}");
    app.sessions
        .update(chat_id, |s| s.mode = Mode::Chat { history: Vec::new() })
        .await;

    let image = app.config.asset("chat.png");
    match app
        .tg
        .show_screen(chat_id, image.as_deref(), INSTRUCTIONS, chat_keyboard(), replace)
        .await
    {
        Ok(message_id) => {
            app.sessions
                .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
                .await;
        }
        Err(e) => warn!("Failed to show chat instructions: {e}"),
    }
}

/// One exchange: forward the message with the whole accumulated history,
/// then replace the "thinking" placeholder with the reply.
pub async fn exchange(app: &Arc<App>, chat_id: i64, text: &str) {
    // The previous reply's keyboard is stale once a new message arrives.
    let old_menu = app
        .sessions
        .with_session(chat_id, |s| s.menu_message_id.take())
        .await;
    if let Some(old) = old_menu {
        let _ = app.tg.delete_message(chat_id, old).await;
    }

    let history = app
        .sessions
        .with_session(chat_id, |s| match &mut s.mode {
            Mode::Chat { history } => {
                history.push(ChatTurn::user(text));
                Some(history.clone())
            }
            _ => None,
        })
        .await;
    let Some(history) = history else {
        // Mode changed between routing and processing (double-press race).
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

    match app.openai.reply_with_history(&history).await {
        Ok(reply) => {
            app.sessions
                .with_session(chat_id, |s| {
                    if let Mode::Chat { history } = &mut s.mode {
                        history.push(ChatTurn::assistant(reply.clone()));
                    }
                    s.menu_message_id = Some(placeholder);
                })
                .await;

            let text = format!("🤖 <b>Assistant:</b>\n\n{}", html_escape(&reply));
            if let Err(e) = app
                .tg
                .edit_message(chat_id, placeholder, &text, Some(chat_keyboard()))
                .await
            {
                warn!("Failed to show chat reply: {e}");
            }
        }
        Err(e) => {
            warn!("Chat completion failed for chat {chat_id}: {e}");
            let _ = app
                .tg
                .edit_message(
                    chat_id,
                    placeholder,
                    "😔 Sorry, something went wrong while processing your message. Please try again.",
                    Some(chat_keyboard()),
                )
                .await;
            app.sessions
                .with_session(chat_id, |s| s.menu_message_id = Some(placeholder))
                .await;
        }
    }
}

/// Finish the mode: farewell screen, then the main menu after a short pause.
pub async fn finish(app: &Arc<App>, chat_id: i64, message_id: i32) {
    info!("Open chat finished for chat {chat_id}");
    let epoch = app
        .sessions
        .update(chat_id, |s| {
            s.reset();
            s.epoch
        })
        .await;

    let _ = app
        .tg
        .replace_screen(chat_id, message_id, "👋 Chat finished. See you around!", None)
        .await;

    menu::schedule_main_menu(app.clone(), chat_id, Some(message_id), menu::MENU_DELAY, epoch);
}
