use std::env;
use std::path::PathBuf;

use crate::llm::ProviderKind;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub llm: LlmConfig,
}

/// API keys and endpoints for the LLM providers. A provider without a key is
/// still configured; calls to it fail with `LlmError::MissingApiKey`.
#[derive(Clone, Debug, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub aiml_api_key: Option<String>,
    pub gemini_api_base: Option<String>,
    pub openai_api_base: Option<String>,
    pub aiml_api_base: Option<String>,
    pub text_provider: ProviderKind,
    pub pdf_provider: ProviderKind,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:fitlog.db?mode=rwc".to_string()),
            host,
            port,
            storage_dir: PathBuf::from(
                env::var("STORAGE_DIR").unwrap_or_else(|_| "storage".to_string()),
            ),
            public_base_url,
            llm: LlmConfig::from_env(),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            aiml_api_key: non_empty_var("AIML_API_KEY"),
            gemini_api_base: non_empty_var("GEMINI_API_BASE"),
            openai_api_base: non_empty_var("OPENAI_API_BASE"),
            aiml_api_base: non_empty_var("AIML_API_BASE"),
            text_provider: non_empty_var("LLM_TEXT_PROVIDER")
                .and_then(|v| ProviderKind::parse(&v))
                .unwrap_or(ProviderKind::Gemini),
            pdf_provider: non_empty_var("LLM_PDF_PROVIDER")
                .and_then(|v| ProviderKind::parse(&v))
                .unwrap_or(ProviderKind::OpenAi),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
