use std::collections::HashMap;

use serde_json::Value;

use crate::{cli::SchemaCommand, error::GopError, gateway::GopClient, logsink::ResponseLog};

const OP_SCHEMA_GET: &str = "/alibaba/icbu/product/schema/get";
const OP_SCHEMA_LEVEL_GET: &str = "/icbu/product/schema/level/get";
const OP_SCHEMA_ADD_DRAFT: &str = "/icbu/product/schema/add/draft";
const OP_SCHEMA_RENDER_DRAFT: &str = "/icbu/product/schema/render/draft";
const OP_SCHEMA_UPDATE: &str = "/icbu/product/schema/update";

/// The level-get endpoint takes its request as a small XML document in
/// addition to the flat `cat_id`.
fn level_request_xml(cat_id: i64) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<request>\n    <cat_id>{cat_id}</cat_id>\n</request>"
    )
}

/// Read a schema payload from disk and re-serialize it compactly so the
/// signed value matches the transmitted value byte for byte.
async fn schema_data_from_file(path: &str) -> Result<String, GopError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let parsed: Value = serde_json::from_str(&raw)?;
    Ok(parsed.to_string())
}

pub async fn run(
    cmd: SchemaCommand,
    client: &GopClient,
    log: &ResponseLog,
) -> Result<(), GopError> {
    let body = match cmd {
        SchemaCommand::Get { cat_id, schema_id } => {
            let mut extra = HashMap::new();
            extra.insert("cat_id".into(), cat_id.to_string());
            if let Some(id) = schema_id {
                extra.insert("schema_id".into(), id);
            }
            super::call(client, log, OP_SCHEMA_GET, extra).await?
        }
        SchemaCommand::LevelGet { cat_id, language } => {
            let mut extra = HashMap::new();
            extra.insert("cat_id".into(), cat_id.to_string());
            extra.insert("language".into(), language);
            extra.insert("xml".into(), level_request_xml(cat_id));
            super::call(client, log, OP_SCHEMA_LEVEL_GET, extra).await?
        }
        SchemaCommand::AddDraft { cat_id, file } => {
            let mut extra = HashMap::new();
            extra.insert("cat_id".into(), cat_id.to_string());
            extra.insert("schema_data".into(), schema_data_from_file(&file).await?);
            super::call(client, log, OP_SCHEMA_ADD_DRAFT, extra).await?
        }
        SchemaCommand::RenderDraft { draft_id, language } => {
            let mut extra = HashMap::new();
            extra.insert("draft_id".into(), draft_id);
            if let Some(lang) = language {
                extra.insert("language".into(), lang);
            }
            super::call(client, log, OP_SCHEMA_RENDER_DRAFT, extra).await?
        }
        SchemaCommand::Update { schema_id, file } => {
            let mut extra = HashMap::new();
            extra.insert("schema_id".into(), schema_id);
            extra.insert("schema_data".into(), schema_data_from_file(&file).await?);
            super::call(client, log, OP_SCHEMA_UPDATE, extra).await?
        }
    };
    super::emit(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_request_xml_embeds_category() {
        let xml = level_request_xml(1201);
        assert!(xml.starts_with("<?xml version=\"1.0\""));
        assert!(xml.contains("<cat_id>1201</cat_id>"));
    }

    #[tokio::test]
    async fn schema_data_is_validated_and_compacted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        tokio::fs::write(&path, "{\n  \"fields\": [ 1, 2 ]\n}")
            .await
            .unwrap();
        let data = schema_data_from_file(path.to_str().unwrap()).await.unwrap();
        assert_eq!(data, "{\"fields\":[1,2]}");

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(schema_data_from_file(path.to_str().unwrap()).await.is_err());
    }
}
