use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::{
    cli::{GroupOperation, PhotoPageArgs, PhotobankCommand},
    error::GopError,
    gateway::{self, GopClient},
    logsink::ResponseLog,
};

const OP_LIST: &str = "/icbu/product/photobank/list";
const OP_GROUP_LIST: &str = "/icbu/product/photobank/group/list";
const OP_GROUP_OPERATE: &str = "/icbu/product/photobank/group/operate";
const OP_UPLOAD: &str = "/alibaba/icbu/photobank/upload";

fn page_request(page: &PhotoPageArgs) -> Map<String, Value> {
    let mut req = Map::new();
    req.insert("currentPage".into(), json!(page.current_page));
    req.insert("pageSize".into(), json!(page.page_size));
    for (key, value) in [
        ("gmtCreateStart", &page.gmt_create_start),
        ("gmtCreateEnd", &page.gmt_create_end),
        ("gmtModifiedStart", &page.gmt_modified_start),
        ("gmtModifiedEnd", &page.gmt_modified_end),
    ] {
        if let Some(v) = value {
            req.insert(key.into(), json!(v));
        }
    }
    req
}

/// Build the `request` object for a group operation, enforcing the
/// per-operation required fields the gateway would otherwise reject.
fn group_operate_request(
    operation: GroupOperation,
    group_id: Option<i64>,
    group_name: Option<String>,
    description: String,
) -> Result<Value, GopError> {
    let mut req = Map::new();
    match operation {
        GroupOperation::Create => {
            let name = group_name
                .ok_or_else(|| GopError::Other("--group-name is required for create".into()))?;
            req.insert("operation".into(), json!("create"));
            req.insert("groupName".into(), json!(name));
            req.insert("description".into(), json!(description));
        }
        GroupOperation::Update => {
            let id = group_id
                .ok_or_else(|| GopError::Other("--group-id is required for update".into()))?;
            let name = group_name
                .ok_or_else(|| GopError::Other("--group-name is required for update".into()))?;
            req.insert("operation".into(), json!("update"));
            req.insert("groupId".into(), json!(id));
            req.insert("groupName".into(), json!(name));
            req.insert("description".into(), json!(description));
        }
        GroupOperation::Delete => {
            let id = group_id
                .ok_or_else(|| GopError::Other("--group-id is required for delete".into()))?;
            req.insert("operation".into(), json!("delete"));
            req.insert("groupId".into(), json!(id));
        }
    }
    Ok(Value::Object(req))
}

pub async fn run(
    cmd: PhotobankCommand,
    client: &GopClient,
    log: &ResponseLog,
) -> Result<(), GopError> {
    let body = match cmd {
        PhotobankCommand::List { group_id, page } => {
            let mut req = page_request(&page);
            if let Some(id) = group_id {
                req.insert("groupId".into(), json!(id));
            }
            let mut extra = HashMap::new();
            extra.insert("request".into(), Value::Object(req).to_string());
            super::call(client, log, OP_LIST, extra).await?
        }
        PhotobankCommand::GroupList { page } => {
            let mut extra = HashMap::new();
            extra.insert("request".into(), Value::Object(page_request(&page)).to_string());
            super::call(client, log, OP_GROUP_LIST, extra).await?
        }
        PhotobankCommand::GroupOperate {
            operation,
            group_id,
            group_name,
            description,
        } => {
            let req = group_operate_request(operation, group_id, group_name, description)?;
            let mut extra = HashMap::new();
            extra.insert("request".into(), req.to_string());
            super::call(client, log, OP_GROUP_OPERATE, extra).await?
        }
        PhotobankCommand::Upload {
            file,
            group_id,
            image_name,
        } => {
            let image_name = image_name.unwrap_or_else(|| {
                Path::new(&file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone())
            });
            let bytes = tokio::fs::read(&file).await?;
            tracing::info!(%image_name, size = bytes.len(), "uploading image");

            let mut req = Map::new();
            if let Some(id) = group_id {
                req.insert("groupId".into(), json!(id));
            }
            req.insert("imageName".into(), json!(image_name.clone()));
            let mut extra = HashMap::new();
            extra.insert("request".into(), Value::Object(req).to_string());

            let mime = gateway::image_mime(&image_name);
            let (status, body) = client
                .execute_multipart_raw(OP_UPLOAD, extra.clone(), image_name, bytes, mime)
                .await?;
            log.record(OP_UPLOAD, &extra, &body).await?;
            gateway::check_envelope(OP_UPLOAD, status, &body)?;
            body
        }
    };
    super::emit(&body)
}
