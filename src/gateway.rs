use std::collections::HashMap;

use reqwest::StatusCode;
use serde_json::Value;

use crate::{config::Settings, error::GopError, http_client, sign};

/// Name of the signature field attached to every signed request. Never part
/// of the signed parameter set itself.
pub const SIGN_FIELD: &str = "sign";

fn http_err(operation: &str) -> impl FnOnce(reqwest::Error) -> GopError + '_ {
    move |source| GopError::Http {
        source,
        operation: operation.to_string(),
    }
}

/// Client for the GOP gateway (`/rest`). All catalog calls go through here:
/// system parameters are merged with the per-call parameters, the set is
/// signed with HMAC-SHA256 keyed by the app secret, and the result is POSTed
/// as a form body under the `X-Protocol: GOP` header.
pub struct GopClient {
    http: reqwest::Client,
    gateway_url: String,
    app_key: String,
    app_secret: String,
    access_token: Option<String>,
}

impl GopClient {
    pub fn new(settings: &Settings) -> Result<Self, GopError> {
        let http = http_client::builder().build().map_err(http_err("client"))?;
        Ok(Self {
            http,
            gateway_url: settings.gateway_url.clone(),
            app_key: settings.app_key()?.to_string(),
            app_secret: settings.app_secret()?.to_string(),
            access_token: settings.access_token.clone(),
        })
    }

    /// System parameters common to every GOP call. The timestamp is epoch
    /// milliseconds and must be regenerated per request.
    fn system_params(&self, operation: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("app_key".into(), self.app_key.clone());
        params.insert("format".into(), "json".into());
        params.insert("method".into(), operation.to_string());
        params.insert("sign_method".into(), "sha256".into());
        params.insert(
            "timestamp".into(),
            chrono::Utc::now().timestamp_millis().to_string(),
        );
        if let Some(token) = &self.access_token {
            params.insert("access_token".into(), token.clone());
        }
        params
    }

    /// Merge system and per-call parameters and attach the signature.
    /// Exposed for tests; callers should use [`execute_raw`](Self::execute_raw).
    pub fn signed_params(
        &self,
        operation: &str,
        extra: HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut params = self.system_params(operation);
        params.extend(extra);
        // The sign field must never enter the signed set, even if a caller
        // passed one through.
        params.remove(SIGN_FIELD);
        let signature = sign::sign_hmac_sha256(&params, &self.app_secret, operation);
        params.insert(SIGN_FIELD.into(), signature);
        params
    }

    /// Send a signed call and return the decoded body without inspecting the
    /// error envelope. Callers that need the body even for rejected requests
    /// (to log it) check the envelope themselves.
    pub async fn execute_raw(
        &self,
        operation: &str,
        extra: HashMap<String, String>,
    ) -> Result<(StatusCode, Value), GopError> {
        let params = self.signed_params(operation, extra);
        tracing::debug!(%operation, "sending GOP request");
        let resp = self
            .http
            .post(&self.gateway_url)
            .header("X-Protocol", "GOP")
            .form(&params)
            .send()
            .await
            .map_err(http_err(operation))?;
        let status = resp.status();
        let body: Value = resp.json().await.map_err(http_err(operation))?;
        Ok((status, body))
    }

    /// Variant of [`execute_raw`](Self::execute_raw) for the photobank upload: the
    /// text parameters are signed exactly as in a form call, then sent as
    /// multipart fields alongside the file part (the file bytes are not part
    /// of the signed string).
    pub async fn execute_multipart_raw(
        &self,
        operation: &str,
        extra: HashMap<String, String>,
        file_name: String,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<(StatusCode, Value), GopError> {
        let params = self.signed_params(operation, extra);
        let mut form = reqwest::multipart::Form::new();
        for (k, v) in params {
            form = form.text(k, v);
        }
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(http_err(operation))?;
        form = form.part("file", part);
        tracing::debug!(%operation, "sending GOP multipart request");
        let resp = self
            .http
            .post(&self.gateway_url)
            .header("X-Protocol", "GOP")
            .multipart(form)
            .send()
            .await
            .map_err(http_err(operation))?;
        let status = resp.status();
        let body: Value = resp.json().await.map_err(http_err(operation))?;
        Ok((status, body))
    }
}

/// Client for the legacy TOP router. Methods are dotted names
/// (`taobao.top.auth.token.create`), the timestamp is a local
/// `YYYY-MM-DD HH:MM:SS` string, and the signature is the secret-wrapped MD5
/// variant sent as a GET query string.
pub struct TopClient {
    http: reqwest::Client,
    gateway_url: String,
    app_key: String,
    app_secret: String,
}

impl TopClient {
    pub fn new(settings: &Settings) -> Result<Self, GopError> {
        let http = http_client::builder().build().map_err(http_err("client"))?;
        Ok(Self {
            http,
            gateway_url: settings.top_gateway_url.clone(),
            app_key: settings.app_key()?.to_string(),
            app_secret: settings.app_secret()?.to_string(),
        })
    }

    pub fn signed_params(
        &self,
        method: &str,
        extra: HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("method".into(), method.to_string());
        params.insert("app_key".into(), self.app_key.clone());
        params.insert(
            "timestamp".into(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        params.insert("format".into(), "json".into());
        params.insert("v".into(), "2.0".into());
        params.insert("sign_method".into(), "md5".into());
        params.extend(extra);
        params.remove(SIGN_FIELD);
        let signature = sign::sign_md5(&params, &self.app_secret);
        params.insert(SIGN_FIELD.into(), signature);
        params
    }

    pub async fn execute(
        &self,
        method: &str,
        extra: HashMap<String, String>,
    ) -> Result<Value, GopError> {
        let params = self.signed_params(method, extra);
        tracing::debug!(%method, "sending TOP request");
        let resp = self
            .http
            .get(&self.gateway_url)
            .query(&params)
            .send()
            .await
            .map_err(http_err(method))?;
        let status = resp.status();
        let body: Value = resp.json().await.map_err(http_err(method))?;
        check_envelope(method, status, &body)?;
        Ok(body)
    }
}

/// Map the platform's error envelope to a typed error. The gateway reports
/// signature and business failures inside a 200 body, so the payload has to
/// be inspected even on success statuses.
pub fn check_envelope(operation: &str, status: StatusCode, body: &Value) -> Result<(), GopError> {
    let message = body
        .get("error_message")
        .or_else(|| body.get("error_msg"))
        .or_else(|| {
            body.get("error_response")
                .and_then(|e| e.get("msg").or_else(|| e.get("sub_msg")))
        })
        .and_then(|m| m.as_str());
    let code = body
        .get("error_code")
        .or_else(|| body.get("error_response").and_then(|e| e.get("code")))
        .map(|c| match c.as_str() {
            Some(s) => s.to_string(),
            None => c.to_string(),
        });
    if message.is_some() || code.is_some() {
        return Err(GopError::Api {
            operation: operation.to_string(),
            code: code.unwrap_or_else(|| status.as_u16().to_string()),
            message: message.unwrap_or("unspecified gateway error").to_string(),
        });
    }
    if !status.is_success() {
        return Err(GopError::Api {
            operation: operation.to_string(),
            code: status.as_u16().to_string(),
            message: body.to_string(),
        });
    }
    Ok(())
}

/// Content type for an uploaded image, keyed off the file extension. The
/// photobank rejects bare octet streams for known image formats.
pub fn image_mime(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> Settings {
        Settings {
            app_key: Some("12345".into()),
            app_secret: Some("topsecret".into()),
            access_token: Some("tok".into()),
            ..Settings::default()
        }
    }

    #[test]
    fn gop_params_carry_system_fields_and_signature() {
        let client = GopClient::new(&settings()).unwrap();
        let mut extra = HashMap::new();
        extra.insert("product_id".to_string(), "42".to_string());
        let params = client.signed_params("/icbu/product/score/get", extra);

        assert_eq!(params["app_key"], "12345");
        assert_eq!(params["format"], "json");
        assert_eq!(params["sign_method"], "sha256");
        assert_eq!(params["method"], "/icbu/product/score/get");
        assert_eq!(params["access_token"], "tok");
        assert_eq!(params["product_id"], "42");
        // timestamp is epoch millis
        assert!(params["timestamp"].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(params[SIGN_FIELD].len(), 64);
    }

    #[test]
    fn gop_signature_rederives_from_transmitted_set() {
        let client = GopClient::new(&settings()).unwrap();
        let mut extra = HashMap::new();
        extra.insert("cat_id".to_string(), "0".to_string());
        let mut params = client.signed_params("/icbu/product/category/get", extra);
        let sent = params.remove(SIGN_FIELD).unwrap();
        let rederived =
            crate::sign::sign_hmac_sha256(&params, "topsecret", "/icbu/product/category/get");
        assert_eq!(sent, rederived);
    }

    #[test]
    fn caller_supplied_sign_is_discarded_before_signing() {
        let client = GopClient::new(&settings()).unwrap();
        let mut poisoned = HashMap::new();
        poisoned.insert(SIGN_FIELD.to_string(), "FFFF".to_string());
        let mut clean_params = client.signed_params("/op", HashMap::new());
        let mut poisoned_params = client.signed_params("/op", poisoned);
        // timestamps may differ between the two calls; normalize them
        let ts = clean_params["timestamp"].clone();
        poisoned_params.insert("timestamp".into(), ts);
        poisoned_params.remove(SIGN_FIELD);
        clean_params.remove(SIGN_FIELD);
        assert_eq!(clean_params, poisoned_params);
    }

    #[test]
    fn top_params_use_legacy_conventions() {
        let client = TopClient::new(&settings()).unwrap();
        let mut extra = HashMap::new();
        extra.insert("code".to_string(), "authcode".to_string());
        let mut params = client.signed_params("taobao.top.auth.token.create", extra);

        assert_eq!(params["v"], "2.0");
        assert_eq!(params["sign_method"], "md5");
        assert_eq!(params["method"], "taobao.top.auth.token.create");
        // local wall-clock timestamp, not epoch millis
        assert_eq!(params["timestamp"].len(), "2024-01-01 00:00:00".len());

        let sent = params.remove(SIGN_FIELD).unwrap();
        assert_eq!(sent, crate::sign::sign_md5(&params, "topsecret"));
    }

    #[test]
    fn envelope_maps_error_fields() {
        let body = json!({"error_code": "15", "error_message": "Invalid signature"});
        let err = check_envelope("/icbu/product/get", StatusCode::OK, &body).unwrap_err();
        match err {
            GopError::Api { code, message, operation } => {
                assert_eq!(code, "15");
                assert_eq!(message, "Invalid signature");
                assert_eq!(operation, "/icbu/product/get");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn envelope_maps_top_error_response() {
        let body = json!({"error_response": {"code": 27, "msg": "Invalid session"}});
        let err = check_envelope("taobao.top.auth.token.create", StatusCode::OK, &body).unwrap_err();
        match err {
            GopError::Api { code, message, .. } => {
                assert_eq!(code, "27");
                assert_eq!(message, "Invalid session");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn envelope_passes_clean_bodies() {
        let body = json!({"result": {"products": []}});
        assert!(check_envelope("/alibaba/icbu/product/list", StatusCode::OK, &body).is_ok());
    }

    #[test]
    fn envelope_rejects_http_failures() {
        let body = json!({});
        let err = check_envelope("/op", StatusCode::BAD_GATEWAY, &body).unwrap_err();
        match err {
            GopError::Api { code, .. } => assert_eq!(code, "502"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn image_mime_by_extension() {
        assert_eq!(image_mime("photo.JPG"), "image/jpeg");
        assert_eq!(image_mime("photo.png"), "image/png");
        assert_eq!(image_mime("archive.bin"), "application/octet-stream");
    }
}
