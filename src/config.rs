use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// OpenAI API key used for every chat-completion call.
    openai_api_key: String,
    /// Base URL of the chat-completion API.
    #[serde(default = "default_api_base")]
    openai_api_base: String,
    /// Directory for state files (logs). Defaults to current directory.
    data_dir: Option<String>,
    /// Directory holding optional menu images (menu.png, quiz.png, ...).
    assets_dir: Option<String>,
    /// Path to Whisper model file (.bin) for voice transcription.
    whisper_model_path: Option<String>,
    /// TTS endpoint serving /v1/tts (e.g., "http://localhost:8880").
    tts_endpoint: Option<String>,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

pub struct Config {
    pub telegram_bot_token: String,
    pub openai_api_key: String,
    pub openai_api_base: String,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
    /// Directory holding optional menu images.
    pub assets_dir: PathBuf,
    /// Path to Whisper model file (.bin) for voice transcription.
    pub whisper_model_path: Option<PathBuf>,
    /// TTS endpoint serving /v1/tts.
    pub tts_endpoint: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.openai_api_key.is_empty() {
            return Err(ConfigError::Validation("openai_api_key is required".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let assets_dir = file
            .assets_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            openai_api_key: file.openai_api_key,
            openai_api_base: file.openai_api_base,
            data_dir,
            assets_dir,
            whisper_model_path: file.whisper_model_path.map(PathBuf::from),
            tts_endpoint: file.tts_endpoint,
        })
    }

    /// Full path of a menu image asset, if it exists on disk.
    pub fn asset(&self, name: &str) -> Option<PathBuf> {
        let path = self.assets_dir.join(name);
        path.exists().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "openai_api_key": "sk-test"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.openai_api_base, "https://api.openai.com/v1");
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": "",
            "openai_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{
            "telegram_bot_token": "invalid_token_no_colon",
            "openai_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "notanumber:ABCdef",
            "openai_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:",
            "openai_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_api_key() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": ""
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("openai_api_key"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_custom_dirs() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "openai_api_key": "sk-test",
            "data_dir": "/var/lib/omnibot",
            "assets_dir": "/opt/omnibot/images"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/omnibot"));
        assert_eq!(config.assets_dir, PathBuf::from("/opt/omnibot/images"));
    }
}
