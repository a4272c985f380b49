use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "QUEUESWEEP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/queuesweep.toml";
const ENV_PREFIX: &str = "QUEUESWEEP";
const ENV_SEPARATOR: &str = "__";

const API_KEY_ENV_VARS: &[&str] = &["QUEUESWEEP_API_KEY", "SONARR_API_KEY"];

/// Path of the config file when none is given explicitly.
/// `.env` is read first so it can name the file too.
pub fn default_path() -> PathBuf {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(config_path: PathBuf) -> Result<Config, ConfigError> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config, |name| env::var(name).ok());

    Ok(config)
}

/// Secrets are read from dedicated environment variables and take precedence
/// over anything in the file. Blank values are skipped.
fn load_secrets<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(api_key) = API_KEY_ENV_VARS
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
    {
        config.server.api_key = Some(api_key);
    }
}

/// `QUEUESWEEP__SWEEP__POLL_INTERVAL` -> `sweep.poll_interval`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    load_with_environment(config_path, environment())
}

fn load_with_environment(
    config_path: PathBuf,
    environment: Environment,
) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    builder = builder.add_source(environment);

    let config = builder.build()?;
    config.try_deserialize()
}
