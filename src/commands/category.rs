use std::collections::HashMap;

use crate::{cli::CategoryCommand, error::GopError, gateway::GopClient, logsink::ResponseLog};

const OP_CATEGORY_GET: &str = "/icbu/product/category/get";
const OP_ID_MAPPING: &str = "/alibaba/icbu/category/id/mapping";

pub async fn run(
    cmd: CategoryCommand,
    client: &GopClient,
    log: &ResponseLog,
) -> Result<(), GopError> {
    let body = match cmd {
        CategoryCommand::Get { cat_id } => {
            let mut extra = HashMap::new();
            extra.insert("cat_id".into(), cat_id.to_string());
            super::call(client, log, OP_CATEGORY_GET, extra).await?
        }
        CategoryCommand::IdMapping {
            convert_type,
            cat_id,
            attribute_id,
            attribute_value_id,
        } => {
            let mut extra = HashMap::new();
            if let Some(v) = convert_type {
                extra.insert("convert_type".into(), v.to_string());
            }
            if let Some(v) = cat_id {
                extra.insert("cat_id".into(), v.to_string());
            }
            if let Some(v) = attribute_id {
                extra.insert("attribute_id".into(), v.to_string());
            }
            if let Some(v) = attribute_value_id {
                extra.insert("attribute_value_id".into(), v.to_string());
            }
            super::call(client, log, OP_ID_MAPPING, extra).await?
        }
    };
    super::emit(&body)
}
