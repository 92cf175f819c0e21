use serde::Deserialize;

use crate::cli::Cli;
use crate::error::GopError;

/// GOP gateway, the entry point for all signed catalog calls.
pub const DEFAULT_GATEWAY_URL: &str = "https://openapi-api.alibaba.com/rest";
/// OAuth token creation endpoint (unsigned form POST).
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://openapi-api.alibaba.com/oauth/token/create";
/// Browser-facing authorization entry.
pub const DEFAULT_AUTH_ENTRY: &str = "https://openapi-auth.alibaba.com/oauth";
/// Legacy TOP router used by the MD5-signed token calls.
pub const DEFAULT_TOP_GATEWAY_URL: &str = "https://eco.taobao.com/router/rest";

/// Application configuration loaded from file and environment.
///
/// Built once in `main` and passed by reference; credentials are never read
/// from ambient process state after this point.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub gateway_url: String,
    pub oauth_token_url: String,
    pub auth_entry: String,
    pub top_gateway_url: String,
    pub log_dir: String,
    /// Delay between successive pages when paginating through a listing.
    pub page_delay_ms: u64,
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default)]
    pub app_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub auth_code: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.into(),
            oauth_token_url: DEFAULT_OAUTH_TOKEN_URL.into(),
            auth_entry: DEFAULT_AUTH_ENTRY.into(),
            top_gateway_url: DEFAULT_TOP_GATEWAY_URL.into(),
            log_dir: "api_logs".into(),
            page_delay_ms: 500,
            app_key: None,
            app_secret: None,
            access_token: None,
            refresh_token: None,
            auth_code: None,
            redirect_uri: None,
            session_key: None,
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("gateway_url", DEFAULT_GATEWAY_URL)?
            .set_default("oauth_token_url", DEFAULT_OAUTH_TOKEN_URL)?
            .set_default("auth_entry", DEFAULT_AUTH_ENTRY)?
            .set_default("top_gateway_url", DEFAULT_TOP_GATEWAY_URL)?
            .set_default("log_dir", "api_logs")?
            .set_default("page_delay_ms", 500)?
            .add_source(config::Environment::with_prefix("ICBU"));
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::with_name(path));
        }
        let cfg = builder.build()?;
        let mut settings: Settings = cfg.try_deserialize()?;
        if let Some(dir) = &cli.log_dir {
            settings.log_dir = dir.clone();
        }
        Ok(settings)
    }

    pub fn app_key(&self) -> Result<&str, GopError> {
        self.app_key
            .as_deref()
            .ok_or(GopError::MissingCredential("APP_KEY"))
    }

    pub fn app_secret(&self) -> Result<&str, GopError> {
        self.app_secret
            .as_deref()
            .ok_or(GopError::MissingCredential("APP_SECRET"))
    }

    pub fn access_token(&self) -> Result<&str, GopError> {
        self.access_token
            .as_deref()
            .ok_or(GopError::MissingCredential("ACCESS_TOKEN"))
    }

    pub fn refresh_token(&self) -> Result<&str, GopError> {
        self.refresh_token
            .as_deref()
            .ok_or(GopError::MissingCredential("REFRESH_TOKEN"))
    }

    pub fn redirect_uri(&self) -> Result<&str, GopError> {
        self.redirect_uri
            .as_deref()
            .ok_or(GopError::MissingCredential("REDIRECT_URI"))
    }

    pub fn session_key(&self) -> Result<&str, GopError> {
        self.session_key
            .as_deref()
            .ok_or(GopError::MissingCredential("SESSION_KEY"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production_gateways() {
        let s = Settings::default();
        assert_eq!(s.gateway_url, "https://openapi-api.alibaba.com/rest");
        assert_eq!(s.top_gateway_url, "https://eco.taobao.com/router/rest");
        assert_eq!(s.log_dir, "api_logs");
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let s = Settings::default();
        let err = s.app_secret().unwrap_err();
        assert!(err.to_string().contains("APP_SECRET"));
        let err = s.access_token().unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN"));
    }
}
