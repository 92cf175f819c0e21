use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::GopError;

/// Parameters that never reach the log files.
const REDACTED_FIELDS: [&str; 4] = ["sign", "access_token", "session", "client_secret"];

/// Write-only sink for request/response records. One timestamped JSON file
/// per call under the configured directory; nothing ever reads these back.
pub struct ResponseLog {
    dir: PathBuf,
}

impl ResponseLog {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Persist one call record. Secrets are redacted from the request
    /// parameters before anything touches disk.
    pub async fn record(
        &self,
        operation: &str,
        params: &HashMap<String, String>,
        response: &Value,
    ) -> Result<PathBuf, GopError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let now = chrono::Local::now();
        let path = self
            .dir
            .join(format!("{}_{}.json", file_stem(operation), now.format("%Y%m%d%H%M%S")));
        let record = json!({
            "request_info": {
                "operation": operation,
                "timestamp": now.format("%Y-%m-%d %H:%M:%S").to_string(),
                "params": redact(params),
            },
            "response": response,
        });
        tokio::fs::write(&path, serde_json::to_vec_pretty(&record)?).await?;
        tracing::info!(path = %path.display(), "response logged");
        Ok(path)
    }
}

fn redact(params: &HashMap<String, String>) -> HashMap<String, String> {
    params
        .iter()
        .map(|(k, v)| {
            if REDACTED_FIELDS.contains(&k.as_str()) {
                (k.clone(), "<redacted>".to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

/// Turn an operation path or dotted method name into a flat file stem,
/// e.g. `/icbu/product/get` -> `icbu_product_get`.
fn file_stem(operation: &str) -> String {
    operation
        .trim_matches(|c| c == '/' || c == '.')
        .replace(['/', '.'], "_")
}
