use super::models::Config;
use reqwest::Url;
use thiserror::Error;

const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid server base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Unsupported base_url scheme '{scheme}', expected 'http' or 'https'")]
    UnsupportedScheme { scheme: String },

    #[error("No API key configured (set QUEUESWEEP_API_KEY or server.api_key)")]
    MissingApiKey,

    #[error("poll_interval must be positive")]
    ZeroPollInterval,

    #[error("max_backoff ({max_backoff}) is shorter than poll_interval ({poll_interval})")]
    BackoffBelowInterval {
        max_backoff: String,
        poll_interval: String,
    },

    #[error("page_size must be between 1 and 1000, got {0}")]
    InvalidPageSize(u32),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_sweep(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let server = &config.server;

    let url = Url::parse(&server.base_url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: server.base_url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }

    match server.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {}
        _ => return Err(ValidationError::MissingApiKey),
    }

    if server.page_size == 0 || server.page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::InvalidPageSize(server.page_size));
    }

    Ok(())
}

fn validate_sweep(config: &Config) -> Result<(), ValidationError> {
    let sweep = &config.sweep;

    if sweep.poll_interval.as_duration().is_zero() {
        return Err(ValidationError::ZeroPollInterval);
    }

    if let Some(max_backoff) = sweep.max_backoff {
        if max_backoff < sweep.poll_interval {
            return Err(ValidationError::BackoffBelowInterval {
                max_backoff: max_backoff.to_string(),
                poll_interval: sweep.poll_interval.to_string(),
            });
        }
    }

    Ok(())
}
