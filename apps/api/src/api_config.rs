use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use bizdock_application::DEFAULT_ROUND_TRIP_TIMEOUT;
use bizdock_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub session_issuer_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub session_idle_minutes: u32,
    pub round_trip_timeout: Duration,
    pub manage_archived_portfolio_entries: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let database_max_connections =
            positive_number_env("DATABASE_MAX_CONNECTIONS", 10)?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let session_issuer_token = required_non_empty_env("SESSION_ISSUER_TOKEN")?;
        if session_issuer_token.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_ISSUER_TOKEN must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = flag_value(env::var("SESSION_COOKIE_SECURE").ok().as_deref());
        let session_idle_minutes = positive_number_env("SESSION_IDLE_MINUTES", 30)?;
        let round_trip_timeout =
            round_trip_timeout_value(env::var("ACCESS_ROUND_TRIP_TIMEOUT_MS").ok().as_deref())?;
        let manage_archived_portfolio_entries = flag_value(
            env::var("MANAGE_ARCHIVED_PORTFOLIO_ENTRIES")
                .ok()
                .as_deref(),
        );

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            frontend_url,
            session_issuer_token,
            api_host,
            api_port,
            cookie_secure,
            session_idle_minutes,
            round_trip_timeout,
            manage_archived_portfolio_entries,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn flag_value(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn round_trip_timeout_value(value: Option<&str>) -> Result<Duration, AppError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_ROUND_TRIP_TIMEOUT);
    };

    let milliseconds = value.parse::<u64>().map_err(|error| {
        AppError::Validation(format!("invalid ACCESS_ROUND_TRIP_TIMEOUT_MS: {error}"))
    })?;
    if milliseconds == 0 {
        return Err(AppError::Validation(
            "ACCESS_ROUND_TRIP_TIMEOUT_MS must be greater than zero".to_owned(),
        ));
    }

    Ok(Duration::from_millis(milliseconds))
}

fn positive_number_env(name: &str, default: u32) -> Result<u32, AppError> {
    positive_number_value(name, env::var(name).ok().as_deref(), default)
}

fn positive_number_value(name: &str, value: Option<&str>, default: u32) -> Result<u32, AppError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };

    match value.parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        Ok(_) => Err(AppError::Validation(format!("{name} must be greater than zero"))),
        Err(error) => Err(AppError::Validation(format!("invalid {name}: {error}"))),
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
