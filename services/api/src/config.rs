use std::path::PathBuf;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailSecurity {
    /// TLS from the first byte (usually port 465).
    Tls,
    /// Plain connect upgraded with STARTTLS before AUTH (usually port 587).
    StartTls,
    /// No encryption at all. Only for local relays.
    None,
}

impl MailSecurity {
    /// `EMAIL_USE_TLS` selects implicit TLS; `EMAIL_INSECURE` opts out of
    /// STARTTLS. Implicit TLS wins when both are set.
    pub fn from_flags(use_tls: bool, insecure: bool) -> Self {
        match (use_tls, insecure) {
            (true, _) => Self::Tls,
            (false, true) => Self::None,
            (false, false) => Self::StartTls,
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    /// Default 587. Env var: `EMAIL_PORT`.
    pub port: u16,
    /// Login name, also used as the sender address.
    pub username: String,
    pub password: String,
    /// Default STARTTLS. Env vars: `EMAIL_USE_TLS`, `EMAIL_INSECURE`.
    pub security: MailSecurity,
}

/// API service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis URL for the response cache.
    pub redis_url: String,
    /// TCP port for the HTTP server (default 8000). Env var: `API_PORT`.
    pub api_port: u16,
    /// Externally visible base URL used in mailed links.
    pub public_base_url: String,
    /// Directory served under `/static`; photos are written below it.
    pub static_root: PathBuf,
    pub mail: MailConfig,
    /// TTL for cached list and lookup responses (default 20).
    pub cache_list_ttl_secs: u64,
    /// TTL for cached statistics (default 60).
    pub cache_stats_ttl_secs: u64,
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            api_port: parsed_or("API_PORT", 8000),
            public_base_url: std::env::var("PUBLIC_BASE_URL").expect("PUBLIC_BASE_URL"),
            static_root: std::env::var("STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./static")),
            mail: MailConfig {
                host: std::env::var("EMAIL_HOST").expect("EMAIL_HOST"),
                port: parsed_or("EMAIL_PORT", 587),
                username: std::env::var("EMAIL_USERNAME").expect("EMAIL_USERNAME"),
                password: std::env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD"),
                security: MailSecurity::from_flags(
                    parsed_or("EMAIL_USE_TLS", false),
                    parsed_or("EMAIL_INSECURE", false),
                ),
            },
            cache_list_ttl_secs: parsed_or("CACHE_LIST_TTL_SECS", 20),
            cache_stats_ttl_secs: parsed_or("CACHE_STATS_TTL_SECS", 60),
        }
    }
}
