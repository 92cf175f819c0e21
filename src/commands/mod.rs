pub mod category;
pub mod photobank;
pub mod product;
pub mod schema;

use std::collections::HashMap;

use serde_json::Value;

use crate::{error::GopError, gateway, gateway::GopClient, logsink::ResponseLog};

/// Execute one signed gateway call, log the response (also for rejected
/// requests), then surface any gateway error envelope.
pub async fn call(
    client: &GopClient,
    log: &ResponseLog,
    operation: &str,
    extra: HashMap<String, String>,
) -> Result<Value, GopError> {
    let (status, body) = client.execute_raw(operation, extra.clone()).await?;
    log.record(operation, &extra, &body).await?;
    gateway::check_envelope(operation, status, &body)?;
    Ok(body)
}

/// Print a response body the way every subcommand reports its result.
pub fn emit(body: &Value) -> Result<(), GopError> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
