//! Conversation routing: per-user sessions, the dispatcher, and one module
//! per mode.

pub mod audio;
pub mod chat;
pub mod dispatch;
pub mod fact;
pub mod menu;
pub mod persona;
pub mod quiz;
pub mod registry;
pub mod session;
pub mod telegram;
pub mod translate;
pub mod tts;
pub mod voice;
pub mod whisper;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::openai::OpenAi;
use session::Sessions;
use telegram::TelegramClient;
use tts::Synthesizer;
use whisper::Transcriber;

/// Speech services; present only when both ends of the pipeline are
/// configured.
pub struct VoiceSupport {
    pub stt: Transcriber,
    pub tts: Synthesizer,
}

/// Shared application state, accessible from all handlers.
pub struct App {
    pub config: Config,
    pub openai: OpenAi,
    pub sessions: Sessions,
    pub tg: TelegramClient,
    pub voice: Option<VoiceSupport>,
}
