use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    cli::AuthCommand,
    config::Settings,
    error::GopError,
    gateway::{self, TopClient},
    http_client,
    logsink::ResponseLog,
    sign,
};

const TOKEN_REFRESH_OPERATION: &str = "/auth/token/refresh";
const LEGACY_TOKEN_METHOD: &str = "taobao.top.auth.token.create";

/// Token payload returned by both the OAuth endpoint and the refresh call.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_expires_in: Option<i64>,
    pub account: Option<String>,
}

/// URL the operator opens in a browser to grant access.
pub fn authorize_url(settings: &Settings) -> Result<String, GopError> {
    Ok(format!(
        "{}/authorize?response_type=code&redirect_uri={}&client_id={}",
        settings.auth_entry,
        settings.redirect_uri()?,
        settings.app_key()?
    ))
}

/// Pull the `code` query parameter out of the URL the browser was redirected
/// to after authorization.
pub fn extract_auth_code(redirect_url: &str) -> Result<String, GopError> {
    let url = reqwest::Url::parse(redirect_url)
        .map_err(|e| GopError::Other(format!("invalid redirect URL: {e}")))?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| GopError::Other("redirect URL carries no authorization code".into()))
}

/// Rewrite `KEY=VALUE` lines in a dotenv-style file, appending keys that are
/// not present yet. Lines for other keys, comments and blanks are kept as-is.
pub async fn update_env_file(
    path: impl AsRef<Path>,
    updates: &[(&str, &str)],
) -> Result<(), GopError> {
    let path = path.as_ref();
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let mut seen: Vec<&str> = Vec::new();
    let mut out = String::new();
    for line in existing.lines() {
        let replaced = updates.iter().copied().find(|(k, _)| {
            line.split_once('=')
                .map(|(name, _)| name.trim() == *k)
                .unwrap_or(false)
        });
        match replaced {
            Some((k, v)) => {
                out.push_str(&format!("{k}={v}\n"));
                seen.push(k);
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    for (k, v) in updates {
        if !seen.contains(k) {
            out.push_str(&format!("{k}={v}\n"));
        }
    }
    tokio::fs::write(path, out).await?;
    tracing::info!(path = %path.display(), "credentials file updated");
    Ok(())
}

async fn persist_tokens(env_file: &Option<String>, token: &TokenResponse) -> Result<(), GopError> {
    let Some(path) = env_file else { return Ok(()) };
    let mut updates: Vec<(&str, &str)> = Vec::new();
    if let Some(t) = &token.access_token {
        updates.push(("ACCESS_TOKEN", t));
    }
    if let Some(t) = &token.refresh_token {
        updates.push(("REFRESH_TOKEN", t));
    }
    if updates.is_empty() {
        return Err(GopError::Other("response carries no tokens to persist".into()));
    }
    update_env_file(path, &updates).await
}

fn report_expiry(token: &TokenResponse) {
    if let Some(account) = &token.account {
        tracing::info!(%account, "token issued");
    }
    for (label, secs) in [
        ("access token", token.expires_in),
        ("refresh token", token.refresh_expires_in),
    ] {
        if let Some(secs) = secs {
            let at = chrono::Local::now() + chrono::Duration::seconds(secs);
            tracing::info!("{label} expires at {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
}

/// Exchange the authorization code for tokens at the OAuth endpoint. This is
/// the one call in the system that carries the secret in the body instead of
/// proving it through a signature.
async fn create_token(settings: &Settings, code: &str) -> Result<Value, GopError> {
    let http = http_client::builder().build().map_err(|e| GopError::Http {
        source: e,
        operation: "oauth/token/create".into(),
    })?;
    let mut form = HashMap::new();
    form.insert("grant_type", "authorization_code");
    form.insert("client_id", settings.app_key()?);
    form.insert("client_secret", settings.app_secret()?);
    form.insert("code", code);
    form.insert("redirect_uri", settings.redirect_uri()?);
    let resp = http
        .post(&settings.oauth_token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| GopError::Http {
            source: e,
            operation: "oauth/token/create".into(),
        })?;
    let status = resp.status();
    let body: Value = resp.json().await.map_err(|e| GopError::Http {
        source: e,
        operation: "oauth/token/create".into(),
    })?;
    gateway::check_envelope("oauth/token/create", status, &body)?;
    Ok(body)
}

/// Refresh the access token. The refresh call signs and transmits only its
/// own four parameters and POSTs to `<gateway><operation>`; it does not carry
/// the usual `format`/`method` system fields.
async fn refresh_token(settings: &Settings) -> Result<Value, GopError> {
    let operation = TOKEN_REFRESH_OPERATION;
    let mut params: HashMap<String, String> = HashMap::new();
    params.insert("app_key".into(), settings.app_key()?.to_string());
    params.insert("refresh_token".into(), settings.refresh_token()?.to_string());
    params.insert("sign_method".into(), "sha256".into());
    params.insert(
        "timestamp".into(),
        chrono::Utc::now().timestamp_millis().to_string(),
    );
    let signature = sign::sign_hmac_sha256(&params, settings.app_secret()?, operation);
    params.insert(gateway::SIGN_FIELD.into(), signature);

    let http = http_client::builder().build().map_err(|e| GopError::Http {
        source: e,
        operation: operation.into(),
    })?;
    let url = format!("{}{}", settings.gateway_url, operation);
    let resp = http
        .post(&url)
        .form(&params)
        .send()
        .await
        .map_err(|e| GopError::Http {
            source: e,
            operation: operation.into(),
        })?;
    let status = resp.status();
    let body: Value = resp.json().await.map_err(|e| GopError::Http {
        source: e,
        operation: operation.into(),
    })?;
    gateway::check_envelope(operation, status, &body)?;
    Ok(body)
}

/// Legacy token creation responses nest the payload as a JSON string under
/// `top_auth_token_create_response.token_result`.
fn legacy_token_result(body: &Value) -> Result<TokenResponse, GopError> {
    let raw = body
        .get("top_auth_token_create_response")
        .and_then(|r| r.get("token_result"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| GopError::Other("token_result missing from TOP response".into()))?;
    Ok(serde_json::from_str(raw)?)
}

pub async fn run(
    cmd: AuthCommand,
    settings: &Settings,
    log: &ResponseLog,
) -> Result<(), GopError> {
    match cmd {
        AuthCommand::Authorize {
            redirect_response,
            env_file,
        } => {
            match redirect_response {
                None => {
                    println!("{}", authorize_url(settings)?);
                    tracing::info!(
                        "open the URL above, authorize, then re-run with --redirect-response"
                    );
                }
                Some(url) => {
                    let code = extract_auth_code(&url)?;
                    println!("{code}");
                    if let Some(path) = env_file {
                        update_env_file(path, &[("AUTH_CODE", &code)]).await?;
                    }
                }
            }
            Ok(())
        }
        AuthCommand::CreateToken { code, env_file } => {
            let code = match code.as_deref() {
                Some(c) => c,
                None => settings
                    .auth_code
                    .as_deref()
                    .ok_or(GopError::MissingCredential("AUTH_CODE"))?,
            };
            let body = create_token(settings, code).await?;
            log.record("oauth/token/create", &HashMap::new(), &body).await?;
            let token: TokenResponse = serde_json::from_value(body.clone())?;
            report_expiry(&token);
            persist_tokens(&env_file, &token).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        AuthCommand::CreateTokenLegacy { code, env_file } => {
            let code = match code.as_deref() {
                Some(c) => c,
                None => settings
                    .auth_code
                    .as_deref()
                    .ok_or(GopError::MissingCredential("AUTH_CODE"))?,
            };
            let client = TopClient::new(settings)?;
            let mut extra = HashMap::new();
            extra.insert("code".to_string(), code.to_string());
            let body = client.execute(LEGACY_TOKEN_METHOD, extra).await?;
            log.record(LEGACY_TOKEN_METHOD, &HashMap::new(), &body).await?;
            let token = legacy_token_result(&body)?;
            report_expiry(&token);
            persist_tokens(&env_file, &token).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        AuthCommand::RefreshToken { env_file } => {
            let body = refresh_token(settings).await?;
            log.record(TOKEN_REFRESH_OPERATION, &HashMap::new(), &body).await?;
            let token: TokenResponse = serde_json::from_value(body.clone())?;
            report_expiry(&token);
            persist_tokens(&env_file, &token).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            app_key: Some("12345".into()),
            app_secret: Some("s".into()),
            redirect_uri: Some("https://example.com/callback".into()),
            ..Settings::default()
        }
    }

    #[test]
    fn authorize_url_carries_client_and_redirect() {
        let url = authorize_url(&settings()).unwrap();
        assert_eq!(
            url,
            "https://openapi-auth.alibaba.com/oauth/authorize?response_type=code&redirect_uri=https://example.com/callback&client_id=12345"
        );
    }

    #[test]
    fn authorize_url_requires_redirect_uri() {
        let mut s = settings();
        s.redirect_uri = None;
        assert!(matches!(
            authorize_url(&s),
            Err(GopError::MissingCredential("REDIRECT_URI"))
        ));
    }

    #[test]
    fn auth_code_extraction() {
        let code =
            extract_auth_code("https://example.com/callback?state=x&code=3_500123_abc").unwrap();
        assert_eq!(code, "3_500123_abc");
        assert!(extract_auth_code("https://example.com/callback?state=x").is_err());
        assert!(extract_auth_code("not a url").is_err());
    }

    #[test]
    fn legacy_token_result_unnests_payload() {
        let body = serde_json::json!({
            "top_auth_token_create_response": {
                "token_result": "{\"access_token\":\"at\",\"refresh_token\":\"rt\",\"expires_in\":86400}"
            }
        });
        let token = legacy_token_result(&body).unwrap();
        assert_eq!(token.access_token.as_deref(), Some("at"));
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert_eq!(token.expires_in, Some(86400));

        assert!(legacy_token_result(&serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn env_file_update_preserves_unrelated_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        tokio::fs::write(&path, "# creds\nAPP_KEY=123\nACCESS_TOKEN=old\n")
            .await
            .unwrap();

        update_env_file(&path, &[("ACCESS_TOKEN", "new"), ("REFRESH_TOKEN", "r1")])
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "# creds\nAPP_KEY=123\nACCESS_TOKEN=new\nREFRESH_TOKEN=r1\n");
    }

    #[tokio::test]
    async fn env_file_update_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        update_env_file(&path, &[("AUTH_CODE", "c1")]).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "AUTH_CODE=c1\n");
    }
}
