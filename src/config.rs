use std::path::{Path, PathBuf};

use facet::Facet;

use crate::error::NotesError;
use crate::paths;

const DEFAULT_PORT: u16 = 8006;

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Config {
    #[facet(default)]
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct PlatformConfig {
    #[facet(default)]
    pub api_url: String,
    /// `user@realm!tokenname`
    #[facet(default)]
    pub token_id: String,
    #[facet(default)]
    pub token_secret: String,
    #[facet(default = true)]
    pub verify_tls: bool,
    #[facet(default = 30)]
    pub timeout_s: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            token_id: String::new(),
            token_secret: String::new(),
            verify_tls: true,
            timeout_s: 30,
        }
    }
}

impl PlatformConfig {
    /// API root such as `https://pve.example.com:8006/api2/json`.
    pub fn api_base(&self) -> Result<String, NotesError> {
        let url = reqwest::Url::parse(self.api_url.trim()).map_err(|e| NotesError::Validation {
            message: format!("invalid api_url '{}': {e}", self.api_url),
        })?;
        let host = match url.host_str() {
            Some(h) if matches!(url.scheme(), "http" | "https") => h,
            _ => {
                return Err(NotesError::Validation {
                    message: format!("api_url '{}' needs an http(s) scheme and host", self.api_url),
                });
            }
        };
        let port = url.port().unwrap_or(DEFAULT_PORT);
        Ok(format!("{}://{host}:{port}/api2/json", url.scheme()))
    }

    /// `user@realm` and token name halves of `token_id`.
    pub fn token_parts(&self) -> Result<(&str, &str), NotesError> {
        let Some((user, token)) = self.token_id.split_once('!') else {
            return Err(NotesError::Validation {
                message: "token_id must include '!' separating user and token name, e.g. root@pam!notes"
                    .into(),
            });
        };
        if !user.contains('@') || token.is_empty() {
            return Err(NotesError::Validation {
                message: "token_id user part must include '@realm', e.g. root@pam!notes".into(),
            });
        }
        Ok((user, token))
    }
}

fn validate_config(config: &Config) -> Result<(), NotesError> {
    let platform = &config.platform;
    if platform.api_url.trim().is_empty() {
        return Err(NotesError::Validation {
            message: "api_url is not set (config [platform] or PROXMOX_API_URL)".into(),
        });
    }
    platform.api_base()?;
    platform.token_parts()?;
    if platform.token_secret.trim().is_empty() {
        return Err(NotesError::Validation {
            message: "token_secret is not set (config [platform] or PROXMOX_TOKEN_SECRET)".into(),
        });
    }
    if platform.timeout_s == 0 {
        return Err(NotesError::Validation {
            message: "timeout_s must be at least 1".into(),
        });
    }
    Ok(())
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Overlay `PROXMOX_*` variables from `lookup` onto `config`.
pub fn apply_env(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let p = &mut config.platform;
    if let Some(v) = non_empty("PROXMOX_API_URL") {
        p.api_url = v;
    }
    if let Some(v) = non_empty("PROXMOX_TOKEN_ID") {
        p.token_id = v;
    }
    if let Some(v) = non_empty("PROXMOX_TOKEN_SECRET") {
        p.token_secret = v;
    }
    if let Some(v) = non_empty("PROXMOX_VERIFY") {
        p.verify_tls = truthy(&v);
    }
}

pub fn parse_config(contents: &str, path: &Path) -> Result<Config, NotesError> {
    facet_toml::from_str(contents).map_err(|e| NotesError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// ── public API ────────────────────────────────────────────

/// Load config from `path` (or the default location), then apply the
/// environment. An explicit path must exist; the default one may not.
pub fn load_config(path: Option<&Path>) -> Result<Config, NotesError> {
    let (path, explicit): (PathBuf, bool) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (paths::config_file(), false),
    };

    let mut config = match std::fs::read_to_string(&path) {
        Ok(contents) => parse_config(&contents, &path)?,
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using environment only");
            Config::default()
        }
        Err(source) => {
            return Err(NotesError::ConfigLoad {
                path: path.display().to_string(),
                source,
            });
        }
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn valid_config() -> Config {
        Config {
            platform: PlatformConfig {
                api_url: "https://pve.example.com:8006".into(),
                token_id: "root@pam!notes".into(),
                token_secret: "from-env".into(),
                ..PlatformConfig::default()
            },
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[platform]
api_url = "https://pve.lan"
token_id = "ops@pve!notes"
verify_tls = false
timeout_s = 5
"#;
        let config = parse_config(toml, Path::new("config.toml")).unwrap();
        assert_eq!(config.platform.api_url, "https://pve.lan");
        assert_eq!(config.platform.token_id, "ops@pve!notes");
        assert!(config.platform.token_secret.is_empty());
        assert!(!config.platform.verify_tls);
        assert_eq!(config.platform.timeout_s, 5);
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = parse_config("", Path::new("config.toml")).unwrap();
        assert!(config.platform.verify_tls);
        assert_eq!(config.platform.timeout_s, 30);
    }

    #[test]
    fn api_base_defaults_port() {
        let mut p = valid_config().platform;
        p.api_url = "https://pve.example.com".into();
        assert_eq!(p.api_base().unwrap(), "https://pve.example.com:8006/api2/json");
        p.api_url = "https://pve.example.com:9443/api2/json".into();
        assert_eq!(p.api_base().unwrap(), "https://pve.example.com:9443/api2/json");
    }

    #[test]
    fn api_base_rejects_garbage() {
        let mut p = valid_config().platform;
        p.api_url = "pve.example.com".into();
        assert!(p.api_base().is_err());
        p.api_url = "ftp://pve.example.com".into();
        assert!(p.api_base().is_err());
    }

    #[test]
    fn token_id_shape() {
        let mut p = valid_config().platform;
        assert_eq!(p.token_parts().unwrap(), ("root@pam", "notes"));
        p.token_id = "root@pam".into();
        assert!(p.token_parts().is_err());
        p.token_id = "root!notes".into();
        assert!(p.token_parts().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = valid_config();
        let vars = env(&[
            ("PROXMOX_API_URL", "https://other:8006"),
            ("PROXMOX_TOKEN_SECRET", " s3cr3t "),
            ("PROXMOX_VERIFY", "no"),
            ("PROXMOX_TOKEN_ID", ""),
        ]);
        apply_env(&mut config, |k| vars.get(k).cloned());
        assert_eq!(config.platform.api_url, "https://other:8006");
        assert_eq!(config.platform.token_secret, "s3cr3t");
        assert_eq!(config.platform.token_id, "root@pam!notes");
        assert!(!config.platform.verify_tls);
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "YES", "y", "On"] {
            assert!(truthy(v), "{v}");
        }
        assert!(!truthy("0"));
        assert!(!truthy("off"));
    }

    #[test]
    fn validation_requires_credentials() {
        assert!(validate_config(&valid_config()).is_ok());

        let mut missing_secret = valid_config();
        missing_secret.platform.token_secret.clear();
        assert!(validate_config(&missing_secret).is_err());

        let mut missing_url = valid_config();
        missing_url.platform.api_url.clear();
        assert!(validate_config(&missing_url).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/pvenotes.toml"))).unwrap_err();
        assert!(matches!(err, NotesError::ConfigLoad { .. }));
    }
}
