//! Configuration module - environment variable parsing

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default Anthropic endpoint
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// Model used when `ANTHROPIC_MODEL` is unset
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
/// Default Stripe API root
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines (LOG_FORMAT=json)
    pub log_json: bool,

    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase anonymous key (handed to the SPA via /api/config)
    pub supabase_anon_key: String,
    /// Supabase service role key (bypasses RLS - server only!)
    pub supabase_service_role_key: String,
    /// Supabase JWT secret for token verification
    pub supabase_jwt_secret: String,

    /// Stripe secret API key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Subscription price used when the client does not pick one
    pub stripe_price_id: String,
    /// Stripe API root
    pub stripe_api_base: String,

    /// Anthropic API key; `None` puts the evaluator in fallback mode
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_model: String,

    /// Public base URL for callbacks
    pub public_base_url: String,
    /// Allowed client origin for CORS
    pub client_origin: String,
    /// Directory holding the built SPA
    pub static_dir: PathBuf,
    /// Accounts allowed to call the admin API
    pub admin_emails: Vec<String>,
    /// Global quota for model-backed endpoints
    pub ai_rate_limit_per_sec: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let ai_rate_limit_per_sec = match env::var("AI_RATE_LIMIT_PER_SEC") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("AI_RATE_LIMIT_PER_SEC"))?,
            Err(_) => 5,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),

            supabase_url: required("SUPABASE_URL")?,
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            supabase_service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            supabase_jwt_secret: required("SUPABASE_JWT_SECRET")?,

            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            stripe_price_id: required("STRIPE_PRICE_ID")?,
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string()),

            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),

            public_base_url: required("PUBLIC_BASE_URL")?,
            client_origin: required("CLIENT_ORIGIN")?,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("dist/public")),
            admin_emails: parse_list(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            ai_rate_limit_per_sec,
        })
    }

    /// Whether `email` may use the admin API
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim();
        self.admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_addr", &self.server_addr)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_service_role_key", &"***")
            .field("supabase_jwt_secret", &"***")
            .field("stripe_secret_key", &"***")
            .field("stripe_webhook_secret", &"***")
            .field("stripe_price_id", &self.stripe_price_id)
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "***"))
            .field("anthropic_model", &self.anthropic_model)
            .field("public_base_url", &self.public_base_url)
            .field("client_origin", &self.client_origin)
            .field("static_dir", &self.static_dir)
            .field("admin_emails", &self.admin_emails)
            .field("ai_rate_limit_per_sec", &self.ai_rate_limit_per_sec)
            .finish()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

/// Split a comma-separated list, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
