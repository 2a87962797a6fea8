//! Application configuration. Collaborator credentials, paths, limits.

use crate::domain::DEFAULT_FREE_LIMIT;
use serde::Deserialize;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Listen address. Read from WEEKWISE_BIND_ADDR.
    #[serde(default)]
    pub bind_addr: Option<String>,

    #[serde(default)]
    pub data_dir: Option<String>,

    /// Free AI schedule generations per non-premium user. Read from WEEKWISE_FREE_LIMIT.
    #[serde(default)]
    pub free_limit: Option<u32>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key. Read from WEEKWISE_AI_API_KEY, falling back to OPENAI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI. Read from WEEKWISE_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini". Read from WEEKWISE_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Use the scripted mock model instead of a real API. Read from WEEKWISE_AI_MOCK.
    #[serde(default)]
    pub ai_mock: Option<bool>,

    // ─────────────────────────────────────────────────────────────────────────
    // Identity Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Supabase project URL. Read from WEEKWISE_SUPABASE_URL or NEXT_PUBLIC_SUPABASE_URL.
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase anon key. Read from WEEKWISE_SUPABASE_ANON_KEY or NEXT_PUBLIC_SUPABASE_ANON_KEY.
    #[serde(default)]
    pub supabase_anon_key: Option<String>,

    /// Development tokens as `token=user_id,...`. Read from WEEKWISE_STATIC_TOKENS.
    #[serde(default)]
    pub static_tokens: Option<String>,

    /// Comma-separated user ids flagged premium at startup. Read from WEEKWISE_PREMIUM_USERS.
    #[serde(default)]
    pub premium_users: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("WEEKWISE").try_parsing(true));
        if let Ok(path) = std::env::var("WEEKWISE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let cfg: Self = c.build()?.try_deserialize()?;
        Ok(cfg)
    }

    pub fn bind_addr_or_default(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn free_limit_or_default(&self) -> u32 {
        self.free_limit.unwrap_or(DEFAULT_FREE_LIMIT)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the AI API key if configured. Empty values count as unset.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    pub fn is_ai_mock(&self) -> bool {
        self.ai_mock.unwrap_or(false)
    }

    /// Returns true if a real AI backend is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn supabase_url(&self) -> Option<String> {
        self.supabase_url
            .clone()
            .or_else(|| std::env::var("NEXT_PUBLIC_SUPABASE_URL").ok())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn supabase_anon_key(&self) -> Option<String> {
        self.supabase_anon_key
            .clone()
            .or_else(|| std::env::var("NEXT_PUBLIC_SUPABASE_ANON_KEY").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Premium user ids, trimmed, empties dropped.
    pub fn premium_user_ids(&self) -> Vec<String> {
        self.premium_users
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
