mod bot;
mod config;
mod openai;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use bot::dispatch::{self, Command};
use bot::session::Sessions;
use bot::telegram::TelegramClient;
use bot::tts::Synthesizer;
use bot::whisper::Transcriber;
use bot::{App, VoiceSupport};
use config::Config;
use openai::OpenAi;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "omnibot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("omnibot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting omnibot...");
    info!("Loaded config from {config_path}");

    let voice = build_voice_support(&config);
    if voice.is_none() {
        info!("Voice chat disabled (whisper_model_path/tts_endpoint not configured)");
    }

    let openai = OpenAi::new(config.openai_api_key.clone(), config.openai_api_base.clone());
    let app = Arc::new(App {
        openai,
        sessions: Sessions::new(),
        tg: TelegramClient::new(bot.clone()),
        voice,
        config,
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(dispatch::handle_command),
        )
        .branch(Update::filter_callback_query().endpoint(dispatch::handle_callback))
        .branch(Update::filter_message().endpoint(dispatch::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Both speech services must be configured for voice mode to exist.
fn build_voice_support(config: &Config) -> Option<VoiceSupport> {
    let model_path = config.whisper_model_path.as_ref()?;
    let endpoint = config.tts_endpoint.clone()?;

    let stt = match Transcriber::load(model_path) {
        Ok(stt) => stt,
        Err(e) => {
            warn!("Voice chat disabled: {e}");
            return None;
        }
    };

    Some(VoiceSupport {
        stt,
        tts: Synthesizer::new(endpoint),
    })
}
