use std::{env, str::FromStr};

use anyhow::{Context, anyhow};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    /// Admin session length in seconds.
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    pub salary_cache_ttl: u64,
    pub payroll_retention_months: u32,
    /// Used when a payroll has no professional tax of its own.
    pub professional_tax_default: Option<f64>,

    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            // default 7 days
            access_token_ttl: parse("ACCESS_TOKEN_TTL", &or_default("ACCESS_TOKEN_TTL", "604800"))?,

            rate_login_per_min: parse("RATE_LOGIN_PER_MIN", &or_default("RATE_LOGIN_PER_MIN", "60"))?,
            rate_protected_per_min: parse(
                "RATE_PROTECTED_PER_MIN",
                &or_default("RATE_PROTECTED_PER_MIN", "1000"),
            )?,

            api_prefix: or_default("API_PREFIX", "/api"),
            log_dir: or_default("LOG_DIR", "logs"),

            salary_cache_ttl: parse("SALARY_CACHE_TTL", &or_default("SALARY_CACHE_TTL", "300"))?,
            payroll_retention_months: parse(
                "PAYROLL_RETENTION_MONTHS",
                &or_default("PAYROLL_RETENTION_MONTHS", "12"),
            )?,
            professional_tax_default: lookup("PROFESSIONAL_TAX_DEFAULT")
                .map(|v| parse("PROFESSIONAL_TAX_DEFAULT", &v))
                .transpose()?,

            admin_email: lookup("ADMIN_EMAIL"),
            admin_password: lookup("ADMIN_PASSWORD"),
        })
    }
}

fn parse<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value `{value}`"))
}
