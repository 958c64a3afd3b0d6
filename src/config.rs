use crate::error::{Result, ShortsmithError};
use crate::selection::{SelectionConfig, WindowConfig};
use crate::subtitle::SubtitleConfig;
use crate::transcript::SentenceConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            _ => Err(format!("Unknown provider: {}. Use 'gemini' or 'openai'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Srt,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(OutputFormat::Srt),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'srt' or 'json'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub default_provider: Provider,
    pub default_format: OutputFormat,
    /// Model override for the selected provider.
    pub model: Option<String>,
    pub concurrency: usize,
    pub window: WindowConfig,
    pub selection: SelectionConfig,
    pub sentences: SentenceConfig,
    pub subtitles: SubtitleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            default_provider: Provider::default(),
            default_format: OutputFormat::default(),
            model: None,
            concurrency: 4,
            window: WindowConfig::default(),
            selection: SelectionConfig::default(),
            sentences: SentenceConfig::default(),
            subtitles: SubtitleConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = Self::from_toml(&contents)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str::<Config>(contents)
            .map_err(|e| ShortsmithError::Config(format!("Failed to parse config file: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Ok(provider) = std::env::var("SHORTSMITH_PROVIDER") {
            if let Ok(p) = provider.parse() {
                self.default_provider = p;
            }
        }
        if let Ok(format) = std::env::var("SHORTSMITH_FORMAT") {
            if let Ok(f) = format.parse() {
                self.default_format = f;
            }
        }
        if let Ok(model) = std::env::var("SHORTSMITH_MODEL") {
            self.model = Some(model);
        }
        if let Ok(concurrency) = std::env::var("SHORTSMITH_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.concurrency = c;
            }
        }
    }

    pub fn validate(&self, provider: Provider) -> Result<()> {
        match provider {
            Provider::OpenAi => {
                if self.openai_api_key.is_none() {
                    return Err(ShortsmithError::Config(
                        "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-..."
                            .to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if self.gemini_api_key.is_none() {
                    return Err(ShortsmithError::Config(
                        "GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey"
                            .to_string(),
                    ));
                }
            }
        }

        if self.concurrency == 0 {
            return Err(ShortsmithError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.window.overlap_duration >= self.window.chunk_duration {
            return Err(ShortsmithError::Config(format!(
                "Chunk overlap ({}s) must be shorter than chunk duration ({}s)",
                self.window.overlap_duration, self.window.chunk_duration
            )));
        }

        if self.selection.tolerance < 0.0 {
            return Err(ShortsmithError::Config(
                "Duration tolerance cannot be negative".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("shortsmith").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("OPENAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("whisper".parse::<Provider>().is_err());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("srt".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("ass".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_provider, Provider::Gemini);
        assert_eq!(config.default_format, OutputFormat::Srt);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.window.chunk_duration, 180.0);
        assert_eq!(config.selection.max_duration, 60.0);
        assert_eq!(config.subtitles.max_words, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
default_provider = "openai"

[selection]
max_duration = 45.0
"#,
        )
        .unwrap();

        assert_eq!(config.default_provider, Provider::OpenAi);
        assert_eq!(config.selection.max_duration, 45.0);
        assert_eq!(config.selection.min_duration, 30.0);
        assert_eq!(config.window.overlap_duration, 60.0);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml("concurrency = \"many\"").is_err());
    }

    #[test]
    fn test_validate_missing_api_key() {
        let config = Config::default();
        assert!(config.validate(Provider::Gemini).is_err());
        assert!(config.validate(Provider::OpenAi).is_err());
    }

    #[test]
    fn test_validate_with_api_key() {
        let mut config = Config::default();
        config.gemini_api_key = Some("test-key".to_string());
        assert!(config.validate(Provider::Gemini).is_ok());

        config.openai_api_key = Some("sk-test".to_string());
        assert!(config.validate(Provider::OpenAi).is_ok());
    }

    #[test]
    fn test_validate_overlap() {
        let mut config = Config::default();
        config.gemini_api_key = Some("test-key".to_string());
        config.window.overlap_duration = config.window.chunk_duration;
        assert!(config.validate(Provider::Gemini).is_err());
    }
}
