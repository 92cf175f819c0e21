use std::time::Duration;

use reqwest::ClientBuilder;

/// Build a `reqwest::ClientBuilder` with the defaults every gateway call
/// shares: a request timeout suited to a one-shot CLI invocation.
///
/// Certificate verification is enabled by default.  To opt out (for example,
/// when routing through an intercepting proxy in development), set the
/// environment variable `ICBU_ACCEPT_INVALID_CERTS` to a truthy value
/// (`1`, `true`, `yes`).  Disabling certificate verification is strongly
/// discouraged for production use.
pub fn builder() -> ClientBuilder {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(60));
    let allow_invalid = std::env::var("ICBU_ACCEPT_INVALID_CERTS")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if allow_invalid {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder
}
