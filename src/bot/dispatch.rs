//! Top-level event routing.
//!
//! Commands always enter their mode's start state. Callback payloads are
//! resolved through an explicit ordered table of (pattern, route) pairs,
//! exact matches before prefixes, global fallbacks last. Free text and
//! voice clips are routed by the session's active mode.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::bot::session::{Mode, PersonaState, QuizState, TranslateState};
use crate::bot::{chat, fact, menu, persona, quiz, translate, voice, App};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "main menu")]
    Start,
    #[command(description = "random fact")]
    Random,
    #[command(description = "open chat")]
    Gpt,
    #[command(description = "talk to a famous persona")]
    Personality,
    #[command(description = "play a quiz")]
    Quiz,
    #[command(description = "translator")]
    Translate,
    #[command(description = "voice dialog")]
    Voice,
}

/// How a callback payload is matched.
#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Pattern {
    /// On a hit, returns the variable suffix ("" for exact matches).
    fn matches<'a>(&self, data: &'a str) -> Option<&'a str> {
        match self {
            Pattern::Exact(s) => (data == *s).then_some(""),
            Pattern::Prefix(p) => data.strip_prefix(p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    FactStart,
    FactFinish,
    ChatStart,
    ChatNewDialog,
    ChatFinish,
    PersonaMenu,
    PersonaSelect,
    PersonaFinish,
    QuizMenu,
    QuizTopic,
    QuizNext,
    QuizFinish,
    TranslateMenu,
    LanguageSelect,
    TranslateFinish,
    VoiceStart,
    VoiceStop,
    /// Placeholder "continue" buttons; acknowledged and otherwise ignored.
    Noop,
    MainMenu,
}

/// Ordered routing table: state-scoped exact payloads first, then the
/// prefixed registry selections, global fallbacks last.
static ROUTES: &[(Pattern, Route)] = &[
    (Pattern::Exact("random_fact"), Route::FactStart),
    (Pattern::Exact("random_more"), Route::FactStart),
    (Pattern::Exact("random_finish"), Route::FactFinish),
    (Pattern::Exact("gpt_interface"), Route::ChatStart),
    (Pattern::Exact("gpt_continue"), Route::ChatNewDialog),
    (Pattern::Exact("gpt_finish"), Route::ChatFinish),
    (Pattern::Exact("talk_interface"), Route::PersonaMenu),
    (Pattern::Exact("change_personality"), Route::PersonaMenu),
    (Pattern::Exact("finish_talk"), Route::PersonaFinish),
    (Pattern::Exact("quiz_interface"), Route::QuizMenu),
    (Pattern::Exact("quiz_change_topic"), Route::QuizMenu),
    (Pattern::Exact("quiz_finish"), Route::QuizFinish),
    (Pattern::Exact("translate_interface"), Route::TranslateMenu),
    (Pattern::Exact("change_languages"), Route::TranslateMenu),
    (Pattern::Exact("finish_translate"), Route::TranslateFinish),
    (Pattern::Exact("start_voice_dialog"), Route::VoiceStart),
    (Pattern::Exact("voice_stop"), Route::VoiceStop),
    (Pattern::Exact("continue_chat"), Route::Noop),
    (Pattern::Exact("continue_translate"), Route::Noop),
    (Pattern::Prefix("personality_"), Route::PersonaSelect),
    (Pattern::Prefix("quiz_topic_"), Route::QuizTopic),
    (Pattern::Prefix("quiz_continue_"), Route::QuizNext),
    (Pattern::Prefix("languages_"), Route::LanguageSelect),
    (Pattern::Exact("main_menu"), Route::MainMenu),
];

/// Resolve a callback payload to a route and its key suffix.
pub fn route_callback(data: &str) -> Option<(Route, &str)> {
    ROUTES
        .iter()
        .find_map(|(pattern, route)| pattern.matches(data).map(|suffix| (*route, suffix)))
}

pub async fn handle_command(msg: Message, cmd: Command, app: Arc<App>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    info!("Command from chat {}: {:?}", chat_id, msg.text());

    match cmd {
        Command::Start => menu::render_main_menu(&app, chat_id, None).await,
        Command::Random => fact::entry(&app, chat_id, None).await,
        Command::Gpt => chat::entry(&app, chat_id, None).await,
        Command::Personality => persona::entry(&app, chat_id, None).await,
        Command::Quiz => quiz::entry(&app, chat_id, None).await,
        Command::Translate => translate::entry(&app, chat_id, None).await,
        Command::Voice => voice::entry(&app, chat_id, None).await,
    }

    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, app: Arc<App>) -> ResponseResult<()> {
    app.tg.ack_callback(&q).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        debug!("Callback {data} without a message, ignoring");
        return Ok(());
    };
    let chat_id = message.chat().id.0;
    let message_id = message.id().0;

    let Some((route, suffix)) = route_callback(data) else {
        info!("Unmatched callback payload: {data}");
        return Ok(());
    };
    info!("Callback from chat {}: {} -> {:?}", chat_id, data, route);

    match route {
        Route::FactStart => fact::entry(&app, chat_id, Some(message_id)).await,
        Route::FactFinish => menu::render_main_menu(&app, chat_id, Some(message_id)).await,
        Route::ChatStart | Route::ChatNewDialog => chat::entry(&app, chat_id, Some(message_id)).await,
        Route::ChatFinish => chat::finish(&app, chat_id, message_id).await,
        Route::PersonaMenu => persona::entry(&app, chat_id, Some(message_id)).await,
        Route::PersonaSelect => persona::select(&app, chat_id, message_id, suffix).await,
        Route::PersonaFinish => menu::render_main_menu(&app, chat_id, Some(message_id)).await,
        Route::QuizMenu => quiz::entry(&app, chat_id, Some(message_id)).await,
        Route::QuizTopic => quiz::topic_selected(&app, chat_id, message_id, suffix).await,
        Route::QuizNext => quiz::next_question(&app, chat_id, message_id).await,
        Route::QuizFinish => quiz::finish(&app, chat_id, message_id).await,
        Route::TranslateMenu => translate::entry(&app, chat_id, Some(message_id)).await,
        Route::LanguageSelect => translate::select(&app, chat_id, message_id, suffix).await,
        Route::TranslateFinish => menu::render_main_menu(&app, chat_id, Some(message_id)).await,
        Route::VoiceStart => voice::entry(&app, chat_id, Some(message_id)).await,
        Route::VoiceStop => menu::render_main_menu(&app, chat_id, Some(message_id)).await,
        Route::Noop => debug!("Placeholder callback {data}, nothing to do"),
        Route::MainMenu => menu::render_main_menu(&app, chat_id, Some(message_id)).await,
    }

    Ok(())
}

/// Where a free-text message should go, decided by the active mode.
enum TextTarget {
    Chat,
    Persona(String),
    QuizAnswer,
    Translate(String),
    VoiceHint,
    AwaitingSelection,
    Idle,
}

pub async fn handle_message(msg: Message, app: Arc<App>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    if msg.voice().is_some() {
        voice::handle_voice_clip(&app, &msg).await;
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    // Known commands were consumed by the command branch; anything
    // slash-shaped left over is unknown. Answered when no mode is active,
    // silently dropped inside a mode.
    if text.starts_with('/') {
        let idle = app
            .sessions
            .update(chat_id, |s| matches!(s.mode, Mode::Idle))
            .await;
        if idle {
            info!("Unknown command from chat {chat_id}: {text}");
            let _ = app
                .tg
                .send_message(chat_id, "Sorry, I don't know that command. Try /start.", None)
                .await;
        } else {
            debug!("Dropping unknown command inside an active mode: {text}");
        }
        return Ok(());
    }

    let target = app
        .sessions
        .update(chat_id, |s| match &s.mode {
            Mode::Chat { .. } => TextTarget::Chat,
            Mode::Persona(PersonaState::Talking { key }) => TextTarget::Persona(key.clone()),
            Mode::Persona(PersonaState::Choosing) => TextTarget::AwaitingSelection,
            Mode::Quiz(QuizState::Answering { .. }) => TextTarget::QuizAnswer,
            Mode::Quiz(QuizState::ChoosingTopic) => TextTarget::AwaitingSelection,
            Mode::Translate(TranslateState::Translating { key }) => {
                TextTarget::Translate(key.clone())
            }
            Mode::Translate(TranslateState::Choosing) => TextTarget::AwaitingSelection,
            Mode::Voice { .. } => TextTarget::VoiceHint,
            Mode::Idle => TextTarget::Idle,
        })
        .await;

    match target {
        TextTarget::Chat => chat::exchange(&app, chat_id, text).await,
        TextTarget::Persona(key) => persona::exchange(&app, chat_id, &key, text).await,
        TextTarget::QuizAnswer => quiz::handle_answer(&app, chat_id, text).await,
        TextTarget::Translate(key) => translate::exchange(&app, chat_id, &key, text).await,
        TextTarget::VoiceHint => {
            let _ = app
                .tg
                .send_message(chat_id, "🎤 Send me a voice message, or return to the menu.", None)
                .await;
        }
        TextTarget::AwaitingSelection => {
            debug!("Text from chat {chat_id} while a selection menu is open, ignoring");
        }
        TextTarget::Idle => {
            debug!("Text from chat {chat_id} outside any mode, ignoring");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_routes() {
        assert_eq!(route_callback("main_menu"), Some((Route::MainMenu, "")));
        assert_eq!(route_callback("random_more"), Some((Route::FactStart, "")));
        assert_eq!(route_callback("gpt_finish"), Some((Route::ChatFinish, "")));
        assert_eq!(route_callback("voice_stop"), Some((Route::VoiceStop, "")));
    }

    #[test]
    fn test_prefix_routes_yield_suffix() {
        assert_eq!(
            route_callback("personality_einstein"),
            Some((Route::PersonaSelect, "einstein"))
        );
        assert_eq!(
            route_callback("quiz_topic_science"),
            Some((Route::QuizTopic, "science"))
        );
        assert_eq!(
            route_callback("quiz_continue_science"),
            Some((Route::QuizNext, "science"))
        );
        assert_eq!(
            route_callback("languages_german"),
            Some((Route::LanguageSelect, "german"))
        );
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        // "quiz_change_topic" must not be swallowed by a looser pattern.
        assert_eq!(route_callback("quiz_change_topic"), Some((Route::QuizMenu, "")));
    }

    #[test]
    fn test_unknown_payload_is_none() {
        assert_eq!(route_callback("bogus"), None);
        assert_eq!(route_callback(""), None);
        // A prefix alone with no suffix still routes, with an empty key.
        assert_eq!(route_callback("personality_"), Some((Route::PersonaSelect, "")));
    }

    #[test]
    fn test_placeholder_buttons_are_noops() {
        assert_eq!(route_callback("continue_chat"), Some((Route::Noop, "")));
        assert_eq!(route_callback("continue_translate"), Some((Route::Noop, "")));
    }
}
