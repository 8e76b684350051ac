use std::env;
use std::net::IpAddr;

/// Process configuration, loaded once at startup from the environment (see `.env` / the
/// donor's own `dotenvy::dotenv()` + `env::var` convention). Every knob enumerated here has a
/// typed default except the ones that are meaningless without an operator-supplied value
/// (`database_url`, `paysend_webhook_secret`).
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub paysend_webhook_secret: String,
    pub ip_whitelist: Vec<IpAddr>,
    pub cash_out_expiry_minutes: i64,
    pub transfer_expiry_hours: i64,
    pub expiry_worker_period_seconds: u64,
    pub list_cache_ttl_seconds: u64,
    pub idempotency_ttl_hours: i64,
}

impl Config {
    /// Panics with a descriptive message on a missing required variable or a malformed
    /// optional one — the donor's own `main` does the same with `.expect(...)` rather than
    /// attempting to start the process in a half-configured state.
    pub fn from_env() -> Self {
        Self {
            database_url: require("DATABASE_URL"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 3000),
            paysend_webhook_secret: require("PAYSEND_WEBHOOK_SECRET"),
            ip_whitelist: parse_whitelist(),
            cash_out_expiry_minutes: parse_or("CASH_OUT_EXPIRY_MINUTES", 30),
            transfer_expiry_hours: parse_or("TRANSFER_EXPIRY_HOURS", 24),
            expiry_worker_period_seconds: parse_or("EXPIRY_WORKER_PERIOD_SECONDS", 6 * 60 * 60),
            list_cache_ttl_seconds: parse_or("LIST_CACHE_TTL_SECONDS", 15 * 60),
            idempotency_ttl_hours: parse_or("IDEMPOTENCY_TTL_HOURS", 24),
        }
    }
}

fn require(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} must be set"))
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_whitelist() -> Vec<IpAddr> {
    env::var("IP_WHITELIST")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
