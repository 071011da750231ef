use crate::models::invitation::ExpiryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyConfig {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailRelayConfig {
    pub url: String,
    pub token: Option<String>,
}

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub public_url: String,
    pub legacy: Option<LegacyConfig>,
    pub mail_relay: Option<MailRelayConfig>,
    pub mail_from: String,
    pub expiry: ExpiryPolicy,
    /// Key the rate limiter on `X-Forwarded-For` / `X-Real-IP`. Only safe
    /// behind a reverse proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag_var(name: &str) -> bool {
    non_empty_var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn days_var(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|d| *d >= 0)
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(39100);

        let legacy = non_empty_var("RSVP_LEGACY_URL").map(|url| LegacyConfig {
            url,
            token: non_empty_var("RSVP_LEGACY_TOKEN"),
        });

        let mail_relay = non_empty_var("RSVP_MAIL_RELAY_URL").map(|url| MailRelayConfig {
            url,
            token: non_empty_var("RSVP_MAIL_RELAY_TOKEN"),
        });

        let defaults = ExpiryPolicy::default();
        let expiry = ExpiryPolicy {
            days_before_event: days_var(
                "RSVP_EXPIRY_DAYS_BEFORE_EVENT",
                defaults.days_before_event,
            ),
            min_window_days: days_var("RSVP_MIN_WINDOW_DAYS", defaults.min_window_days),
        };

        Self {
            port,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:rsvp.db?mode=rwc".to_string()),
            public_url: non_empty_var("RSVP_PUBLIC_URL")
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            legacy,
            mail_relay,
            mail_from: non_empty_var("RSVP_MAIL_FROM")
                .unwrap_or_else(|| "rsvp@localhost".to_string()),
            expiry,
            trust_proxy_headers: flag_var("RSVP_TRUST_PROXY_HEADERS"),
        }
    }
}
