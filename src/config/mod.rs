use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Video infrastructure provider API key (upload, transcript, timeline).
    /// The server boots without it, reports degraded health, and fails jobs
    /// at the first provider call.
    #[serde(default)]
    pub videodb_api_key: String,

    /// Video infrastructure provider base URL
    #[serde(default = "default_videodb_base_url")]
    pub videodb_base_url: String,

    /// Translation provider API key
    #[serde(default)]
    pub openai_api_key: String,

    /// Translation provider base URL (any OpenAI-compatible endpoint)
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Chat model used for translation
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Voice provider API key. Absent or empty key puts the service in
    /// demo mode: jobs complete after translation without synthesis.
    pub elevenlabs_api_key: Option<String>,

    /// Voice provider base URL
    #[serde(default = "default_elevenlabs_base_url")]
    pub elevenlabs_base_url: String,

    /// Languages offered for dubbing (comma-separated ISO 639-1 codes)
    #[serde(default = "default_supported_languages")]
    pub supported_languages: Vec<String>,

    /// Per-request timeout for provider HTTP calls, in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// When set, finished jobs are dropped from memory this many seconds
    /// after completion. Unset keeps them for the life of the process.
    pub completed_job_ttl_secs: Option<u64>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_videodb_base_url() -> String {
    "https://api.videodb.io".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_supported_languages() -> Vec<String> {
    ["en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh", "hi", "ar"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_provider_timeout_secs() -> u64 {
    300
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
