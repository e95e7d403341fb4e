// Configuration loader
// Loads settings from ~/.council/config.toml, falling back to environment variables

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::CONFIG_DIR_NAME;
use super::settings::Config;

const MISTRAL_KEY_VAR: &str = "MISTRAL_API_KEY";
const BRAVE_KEY_VAR: &str = "BRAVE_API_KEY";

/// Load configuration from an explicit path, the default config file, or the environment
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };
    load_with_env(path.as_deref(), explicit.is_some(), |key| {
        std::env::var(key).ok()
    })
}

/// Load a `.env` file into the process environment.
///
/// With no path, `.env` is looked up from the working directory upwards and
/// a missing file is not an error. Variables already set are kept.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(p) => dotenvy::from_path(p)
            .map(|_| p.to_path_buf())
            .with_context(|| format!("Failed to load env file {}", p.display()))?,
        None => match dotenvy::dotenv() {
            Ok(found) => found,
            Err(e) if e.not_found() => return Ok(None),
            Err(e) => return Err(e).context("Failed to load .env file"),
        },
    };

    tracing::debug!(path = %loaded.display(), "Loaded environment file");
    Ok(Some(loaded))
}

/// `~/.council/config.toml`, if a home directory can be determined
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join("config.toml"))
}

fn load_with_env<F>(path: Option<&Path>, required: bool, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) if p.exists() => {
            let contents = fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file {}", p.display()))?;
            toml::from_str::<Config>(&contents)
                .with_context(|| format!("Failed to parse config file {}", p.display()))?
        }
        Some(p) if required => bail!("Config file not found: {}", p.display()),
        _ => Config::default(),
    };

    // Environment fills in whatever the file left empty
    if config.provider.api_key.trim().is_empty() {
        if let Some(key) = env(MISTRAL_KEY_VAR).filter(|k| !k.is_empty()) {
            config.provider.api_key = key;
        }
    }
    if !config.search.is_enabled() {
        if let Some(key) = env(BRAVE_KEY_VAR).filter(|k| !k.is_empty()) {
            config.search.api_key = Some(key);
        }
    }

    if config.provider.api_key.trim().is_empty() {
        bail!(
            "No completion API key configured.\n\n\
            Add it to ~/{}/config.toml:\n\n\
            [provider]\n\
            api_key = \"...\"\n\n\
            or set the environment variable:\n\
            export {}=\"...\"",
            CONFIG_DIR_NAME,
            MISTRAL_KEY_VAR
        );
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::debug!(
        model = %config.provider.model,
        search_enabled = config.search.is_enabled(),
        iteration_limit = config.conversation.iteration_limit,
        "Configuration loaded"
    );

    Ok(config)
}
