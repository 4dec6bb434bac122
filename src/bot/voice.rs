//! Voice dialog mode: voice clip in, transcription through Whisper, reply
//! from the model, synthesized voice back out.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{debug, info, warn};

use crate::bot::session::Mode;
use crate::bot::telegram::html_escape;
use crate::bot::{audio, App};
use crate::openai::ChatTurn;

/// Spoken when the clip couldn't be understood.
const FALLBACK_PHRASE: &str =
    "I couldn't make out what you said. Please try speaking more clearly.";

const INSTRUCTIONS: &str = "🎤 <b>Voice chat</b>\n\n\
📱 Send a voice message and I'll answer with my voice!\n\n\
💡 <b>How it works:</b>\n\
1. You send a voice message\n\
2. I transcribe your speech\n\
3. The model writes a reply\n\
4. You get it back as audio\n\n\
🗣️ Speak clearly and not too fast for best results.";

const UNAVAILABLE: &str = "🎤 Voice chat isn't available on this deployment: \
no speech services are configured.";

fn voice_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🏠 Back to menu",
        "voice_stop",
    )]])
}

/// Enter the mode: reset the voice history and show instructions.
pub async fn entry(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    if app.voice.is_none() {
        let _ = match replace {
            Some(message_id) => {
                app.tg
                    .replace_screen(chat_id, message_id, UNAVAILABLE, Some(voice_keyboard()))
                    .await
            }
            None => app.tg.send_message(chat_id, UNAVAILABLE, Some(voice_keyboard())).await,
        };
        return;
    }

    info!("Voice dialog started for chat {chat_id}");
    app.sessions
        .update(chat_id, |s| s.mode = Mode::Voice { history: Vec::new() })
        .await;

    let image = app.config.asset("voice.png");
    match app
        .tg
        .show_screen(chat_id, image.as_deref(), INSTRUCTIONS, voice_keyboard(), replace)
        .await
    {
        Ok(message_id) => {
            app.sessions
                .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
                .await;
        }
        Err(e) => warn!("Failed to show voice instructions: {e}"),
    }
}

/// Process one voice clip end to end. All intermediate audio files are
/// guard-owned inside the conversion helpers, so nothing is left on disk
/// whichever branch runs.
pub async fn handle_voice_clip(app: &Arc<App>, msg: &Message) {
    let chat_id = msg.chat.id.0;

    let in_voice_mode = app
        .sessions
        .update(chat_id, |s| matches!(s.mode, Mode::Voice { .. }))
        .await;
    if !in_voice_mode {
        debug!("Voice clip from chat {chat_id} outside voice mode, ignoring");
        return;
    }
    let Some(support) = &app.voice else {
        let _ = app.tg.send_message(chat_id, UNAVAILABLE, None).await;
        return;
    };
    let Some(clip) = msg.voice() else {
        return;
    };

    info!("Voice clip from chat {chat_id} ({} bytes)", clip.file.size);
    let Ok(placeholder) = app
        .tg
        .send_message(chat_id, "🎧 Listening... ⏳", None)
        .await
    else {
        return;
    };

    let transcript = match app.tg.download_voice(clip.file.id.clone()).await {
        Ok(ogg) => {
            let stt = support.stt.clone();
            let result = tokio::task::spawn_blocking(move || {
                let pcm = audio::ogg_to_pcm(&ogg)?;
                stt.transcribe(&pcm)
            })
            .await
            .unwrap_or_else(|e| Err(format!("Transcription task failed: {e}")));

            match result {
                Ok(text) if !text.is_empty() => Some(text),
                Ok(_) => {
                    warn!("Empty transcription for chat {chat_id}");
                    None
                }
                Err(e) => {
                    warn!("Transcription failed for chat {chat_id}: {e}");
                    None
                }
            }
        }
        Err(e) => {
            warn!("Voice download failed for chat {chat_id}: {e}");
            None
        }
    };

    // On a failed transcription the fixed fallback phrase is the reply;
    // the model isn't consulted and history stays untouched.
    let reply = match &transcript {
        Some(text) => {
            app.tg.typing(chat_id).await;
            let history = app
                .sessions
                .with_session(chat_id, |s| match &mut s.mode {
                    Mode::Voice { history } => {
                        history.push(ChatTurn::user(text.clone()));
                        Some(history.clone())
                    }
                    _ => None,
                })
                .await;
            let Some(history) = history else {
                // The user left voice mode while we were transcribing.
                let _ = app.tg.delete_message(chat_id, placeholder).await;
                return;
            };

            match app.openai.reply_with_history(&history).await {
                Ok(answer) => {
                    app.sessions
                        .with_session(chat_id, |s| {
                            if let Mode::Voice { history } = &mut s.mode {
                                history.push(ChatTurn::assistant(answer.clone()));
                            }
                        })
                        .await;
                    answer
                }
                Err(e) => {
                    warn!("Voice completion failed for chat {chat_id}: {e}");
                    "Sorry, something went wrong while answering. Please try again.".to_string()
                }
            }
        }
        None => FALLBACK_PHRASE.to_string(),
    };

    // The reply always goes out as audio and as text, fallback included.
    match support.tts.synthesize(&reply).await {
        Ok(ogg) => {
            if let Err(e) = app.tg.send_voice(chat_id, ogg).await {
                warn!("Failed to send voice reply: {e}");
            }
        }
        Err(e) => warn!("Speech synthesis failed for chat {chat_id}: {e}"),
    }

    let mut text = String::new();
    if let Some(t) = &transcript {
        text.push_str(&format!("🗣️ <b>You said:</b> {}\n\n", html_escape(t)));
    }
    text.push_str(&format!("🤖 <b>Reply:</b>\n\n{}", html_escape(&reply)));

    if let Err(e) = app
        .tg
        .edit_message(chat_id, placeholder, &text, Some(voice_keyboard()))
        .await
    {
        warn!("Failed to show voice transcript: {e}");
    } else {
        app.sessions
            .with_session(chat_id, |s| s.menu_message_id = Some(placeholder))
            .await;
    }
}
