use crate::auth::keycloak::KeycloakConfig;
use log::LevelFilter;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8888";
const DEFAULT_IDP_URL: &str = "http://localhost:8188";
const DEFAULT_IDP_REALM: &str = "my-quarkus-app";
const DEFAULT_IDP_CLIENT: &str = "frontend";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:4200";
const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub page_size: usize,
    pub idp_url: String,
    pub idp_realm: String,
    pub idp_client_id: String,
    pub redirect_uri: String,
    pub token_file: PathBuf,
    pub log_level: Option<LevelFilter>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            idp_url: DEFAULT_IDP_URL.to_string(),
            idp_realm: DEFAULT_IDP_REALM.to_string(),
            idp_client_id: DEFAULT_IDP_CLIENT.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            token_file: token_file_path(),
            log_level: None,
        }
    }
}

impl AppSettings {
    /// Defaults overridden by `BETDESK_*` environment variables.
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env_or("BETDESK_API_URL", defaults.api_url),
            page_size: std::env::var("BETDESK_PAGE_SIZE")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.page_size),
            idp_url: env_or("BETDESK_IDP_URL", defaults.idp_url),
            idp_realm: env_or("BETDESK_IDP_REALM", defaults.idp_realm),
            idp_client_id: env_or("BETDESK_IDP_CLIENT", defaults.idp_client_id),
            redirect_uri: env_or("BETDESK_REDIRECT_URI", defaults.redirect_uri),
            token_file: std::env::var("BETDESK_TOKEN_FILE")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.token_file),
            log_level: std::env::var("BETDESK_LOG")
                .ok()
                .and_then(|v| v.trim().parse::<LevelFilter>().ok()),
        }
    }

    pub fn keycloak(&self) -> KeycloakConfig {
        KeycloakConfig {
            url: self.idp_url.clone(),
            realm: self.idp_realm.clone(),
            client_id: self.idp_client_id.clone(),
            token_file: self.token_file.clone(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn token_file_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("betdesk").join("tokens.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("betdesk")
            .join("tokens.json");
    }
    PathBuf::from("betdesk-tokens.json")
}
