// src/config/mod.rs
pub mod consts;
pub mod options;

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use options::{
    AppOptions, BrowserOptions, Credentials, PortalOptions, Settings, StoreOptions, VisitMode,
};

use consts::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("could not read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("missing credentials: set credentials.username/password or {ENV_USERNAME}/{ENV_PASSWORD}")]
    MissingCredentials,
}

/// Load options from `path` (or the default location), then overlay the
/// environment. A `.env` file next to the binary is honoured.
///
/// An explicit path that does not exist is an error; a missing default file
/// just means "all defaults".
pub fn load(path: Option<&Path>) -> Result<AppOptions, ConfigError> {
    dotenvy::dotenv().ok();

    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut options = match fs::read_to_string(&path) {
        Ok(text) => {
            let options = parse(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "loaded configuration");
            options
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if explicit {
                return Err(ConfigError::Missing { path });
            }
            debug!(path = %path.display(), "no config file, using defaults");
            AppOptions::default()
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    apply_env(&mut options, |key| env::var(key).ok());
    Ok(options)
}

pub fn parse(text: &str) -> Result<AppOptions, serde_json::Error> {
    serde_json::from_str(text)
}

/// Environment wins over the file. `lookup` is injectable for tests.
pub fn apply_env(options: &mut AppOptions, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty(ENV_USERNAME) {
        options.credentials.username = v;
    }
    if let Some(v) = non_empty(ENV_PASSWORD) {
        options.credentials.password = v;
    }
    if let Some(v) = non_empty(ENV_LOGIN_URL) {
        options.portal.login_url = v;
    }
    if let Some(v) = non_empty(ENV_LISTING_URL) {
        options.portal.listing_url = Some(v);
    }
}

impl AppOptions {
    /// Credentials are only needed by the scraping run, not by the store tools.
    pub fn require_credentials(&self) -> Result<&Credentials, ConfigError> {
        if self.credentials.is_complete() {
            Ok(&self.credentials)
        } else {
            Err(ConfigError::MissingCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Locator;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let opts = parse(r#"{ "credentials": { "username": "u", "password": "p" } }"#).unwrap();
        assert_eq!(opts.credentials.username, "u");
        assert_eq!(opts.settings, Settings::default());
        assert_eq!(opts.portal.listing_url(), DEFAULT_LOGIN_URL);
        assert!(opts.require_credentials().is_ok());
    }

    #[test]
    fn locators_are_data() {
        let opts = parse(
            r#"{
                "login": { "username": { "xpath": "//input[@name='user']" } },
                "settings": { "visit_mode": "same_view", "wait_secs": 3 }
            }"#,
        )
        .unwrap();
        assert_eq!(opts.login.username, Locator::Xpath(s!("//input[@name='user']")));
        assert_eq!(opts.settings.visit_mode, VisitMode::SameView);
        assert_eq!(opts.settings.wait_secs, 3);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut opts = parse(r#"{ "credentials": { "username": "file", "password": "file" } }"#).unwrap();
        let env: HashMap<&str, &str> = [(ENV_USERNAME, "env-user"), (ENV_PASSWORD, "  ")].into();
        apply_env(&mut opts, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(opts.credentials.username, "env-user");
        assert_eq!(opts.credentials.password, "file");
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let opts = AppOptions::default();
        assert!(matches!(opts.require_credentials(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials { username: s!("me"), password: s!("hunter2") };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load(Some(Path::new("./definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }
}
