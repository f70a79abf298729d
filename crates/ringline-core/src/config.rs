use std::path::PathBuf;

use crate::error::Error;

pub const DEFAULT_SENDER: &str = "VonageMCP";
pub const DEFAULT_COUNTRY_CODE: &str = "81";
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "./private.key";
pub const DEFAULT_API_BASE_URL: &str = "https://api.nexmo.com";

/// Process-wide settings, built once at start-up and shared by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub application_id: Option<String>,
    pub private_key_path: PathBuf,
    /// Origin number for outbound voice calls.
    pub voice_from: Option<String>,
    /// Shared secret expected in the `x-api-key` header.
    pub api_key: Option<String>,
    pub default_sender: String,
    /// Country code substituted for the leading `0` of local numbers.
    pub default_country_code: String,
    pub api_base_url: String,
}

/// Application credentials required by every gateway call.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub application_id: &'a str,
    pub private_key_path: &'a std::path::Path,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application_id: None,
            private_key_path: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
            voice_from: None,
            api_key: None,
            default_sender: DEFAULT_SENDER.to_string(),
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. `RINGLINE_API_KEY` falls back to the
    /// application id when absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let application_id = get("VONAGE_APPLICATION_ID");
        let api_key = get("RINGLINE_API_KEY").or_else(|| application_id.clone());

        Self {
            private_key_path: get("VONAGE_PRIVATE_KEY_PATH")
                .map_or(defaults.private_key_path, PathBuf::from),
            voice_from: get("VONAGE_VOICE_FROM"),
            default_sender: get("RINGLINE_DEFAULT_SENDER").unwrap_or(defaults.default_sender),
            default_country_code: get("RINGLINE_COUNTRY_CODE")
                .map(|cc| cc.trim_start_matches('+').to_string())
                .unwrap_or(defaults.default_country_code),
            api_base_url: get("VONAGE_API_URL").unwrap_or(defaults.api_base_url),
            application_id,
            api_key,
        }
    }

    /// Application credentials, or an error naming the missing variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] when no application id is configured.
    pub fn credentials(&self) -> Result<Credentials<'_>, Error> {
        let application_id = self
            .application_id
            .as_deref()
            .ok_or(Error::MissingConfig("VONAGE_APPLICATION_ID"))?;
        Ok(Credentials {
            application_id,
            private_key_path: &self.private_key_path,
        })
    }

    /// Origin number for voice calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] when `VONAGE_VOICE_FROM` is unset.
    pub fn voice_from(&self) -> Result<&str, Error> {
        self.voice_from
            .as_deref()
            .ok_or(Error::MissingConfig("VONAGE_VOICE_FROM"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.application_id.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(config.private_key_path, PathBuf::from("./private.key"));
        assert_eq!(config.default_sender, "VonageMCP");
        assert_eq!(config.default_country_code, "81");
        assert!(config.credentials().is_err());
    }

    #[test]
    fn api_key_falls_back_to_application_id() {
        let config = Config::from_lookup(lookup(&[("VONAGE_APPLICATION_ID", "app-123")]));
        assert_eq!(config.api_key.as_deref(), Some("app-123"));

        let config = Config::from_lookup(lookup(&[
            ("VONAGE_APPLICATION_ID", "app-123"),
            ("RINGLINE_API_KEY", "secret"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("VONAGE_APPLICATION_ID", "  "),
            ("VONAGE_VOICE_FROM", ""),
        ]));
        assert!(config.application_id.is_none());
        assert!(matches!(
            config.voice_from(),
            Err(Error::MissingConfig("VONAGE_VOICE_FROM"))
        ));
    }

    #[test]
    fn country_code_drops_leading_plus() {
        let config = Config::from_lookup(lookup(&[("RINGLINE_COUNTRY_CODE", "+44")]));
        assert_eq!(config.default_country_code, "44");
    }

    #[test]
    fn credentials_borrow_configured_values() {
        let config = Config::from_lookup(lookup(&[
            ("VONAGE_APPLICATION_ID", "app-123"),
            ("VONAGE_PRIVATE_KEY_PATH", "/etc/keys/app.pem"),
        ]));
        let creds = config.credentials().unwrap();
        assert_eq!(creds.application_id, "app-123");
        assert_eq!(creds.private_key_path, std::path::Path::new("/etc/keys/app.pem"));
    }
}
