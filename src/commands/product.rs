use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};

use crate::{
    cli::{DisplayStatus, ListArgs, ProductCommand},
    config::Settings,
    error::GopError,
    gateway::GopClient,
    logsink::ResponseLog,
};

const OP_GET: &str = "/icbu/product/get";
const OP_LIST: &str = "/alibaba/icbu/product/list";
const OP_UPDATE_DISPLAY: &str = "/icbu/product/update/display";
const OP_SCORE: &str = "/icbu/product/score/get";
const OP_AVAILABLE: &str = "/icbu/product/other/available/get";
const OP_ID_ENCRYPT: &str = "/alibaba/icbu/product/id/encrypt";
const OP_GROUP_ADD: &str = "/icbu/product/group/add";
const OP_INVENTORY_GET: &str = "/icbu/product/inventory/get";
const OP_INVENTORY_UPDATE: &str = "/icbu/product/inventory/update";

/// Flat parameters for one page of the product listing. Every value is
/// rendered to its transmitted string form here, before signing.
pub fn list_params(args: &ListArgs) -> HashMap<String, String> {
    let mut extra = HashMap::new();
    extra.insert("filter_type".into(), args.filter_type.clone());
    extra.insert("current_page".into(), args.current_page.to_string());
    extra.insert("page_size".into(), args.page_size.to_string());
    if let Some(v) = &args.subject {
        extra.insert("subject".into(), v.clone());
    }
    if let Some(v) = &args.gmt_modified_from {
        extra.insert("gmt_modified_from".into(), v.clone());
    }
    if let Some(v) = &args.gmt_modified_to {
        extra.insert("gmt_modified_to".into(), v.clone());
    }
    if let Some(v) = args.group_id1 {
        extra.insert("group_id1".into(), v.to_string());
    }
    if let Some(v) = args.group_id2 {
        extra.insert("group_id2".into(), v.to_string());
    }
    if let Some(v) = args.group_id3 {
        extra.insert("group_id3".into(), v.to_string());
    }
    if let Some(v) = args.id {
        extra.insert("id".into(), v.to_string());
    }
    if let Some(v) = args.category_id {
        extra.insert("category_id".into(), v.to_string());
    }
    extra
}

fn page_products(body: &Value) -> Option<(&Vec<Value>, u64)> {
    let result = body.get("result")?;
    let products = result.get("products")?.as_array()?;
    let total = result.get("total_item")?.as_u64().unwrap_or(0);
    Some((products, total))
}

/// Walk every page of the listing, pacing requests between pages, and
/// return one aggregate body.
async fn list_all(
    client: &GopClient,
    log: &ResponseLog,
    settings: &Settings,
    mut args: ListArgs,
) -> Result<Value, GopError> {
    let mut all: Vec<Value> = Vec::new();
    let mut total = 0u64;
    args.current_page = 1;
    loop {
        tracing::info!(page = args.current_page, "fetching product page");
        let body = super::call(client, log, OP_LIST, list_params(&args)).await?;
        match page_products(&body) {
            Some((products, total_item)) => {
                if products.is_empty() {
                    break;
                }
                all.extend(products.iter().cloned());
                total = total_item;
                tracing::info!(fetched = all.len(), total, "progress");
                if total > 0 && all.len() as u64 >= total {
                    break;
                }
            }
            None => break,
        }
        args.current_page += 1;
        tokio::time::sleep(Duration::from_millis(settings.page_delay_ms)).await;
    }
    Ok(json!({"total_item": total, "fetched": all.len(), "products": all}))
}

pub async fn run(
    cmd: ProductCommand,
    client: &GopClient,
    log: &ResponseLog,
    settings: &Settings,
) -> Result<(), GopError> {
    let body = match cmd {
        ProductCommand::Get { product_id } => {
            let mut extra = HashMap::new();
            extra.insert(
                "product_get_request".into(),
                json!({ "productId": product_id }).to_string(),
            );
            super::call(client, log, OP_GET, extra).await?
        }
        ProductCommand::List(args) => {
            super::call(client, log, OP_LIST, list_params(&args)).await?
        }
        ProductCommand::ListAll(args) => list_all(client, log, settings, args).await?,
        ProductCommand::UpdateDisplay { product_id, status } => {
            let mut extra = HashMap::new();
            extra.insert(
                "request".into(),
                json!({
                    "productId": product_id.to_string(),
                    "display": status == DisplayStatus::Online,
                })
                .to_string(),
            );
            super::call(client, log, OP_UPDATE_DISPLAY, extra).await?
        }
        ProductCommand::Score { product_id } => {
            let mut extra = HashMap::new();
            extra.insert("product_id".into(), product_id.to_string());
            super::call(client, log, OP_SCORE, extra).await?
        }
        ProductCommand::Available { product_id } => {
            let mut extra = HashMap::new();
            extra.insert("product_id".into(), product_id.to_string());
            super::call(client, log, OP_AVAILABLE, extra).await?
        }
        ProductCommand::EncryptId {
            product_id,
            convert_type,
        } => {
            let mut extra = HashMap::new();
            extra.insert("product_id".into(), product_id);
            extra.insert("convert_type".into(), convert_type.to_string());
            super::call(client, log, OP_ID_ENCRYPT, extra).await?
        }
        ProductCommand::GroupAdd {
            product_id,
            group_id,
        } => {
            let mut extra = HashMap::new();
            extra.insert(
                "request".into(),
                json!({
                    "productIds": [product_id.to_string()],
                    "groupId": group_id.to_string(),
                })
                .to_string(),
            );
            super::call(client, log, OP_GROUP_ADD, extra).await?
        }
        ProductCommand::InventoryGet { product_id } => {
            let mut extra = HashMap::new();
            extra.insert(
                "inventory_get_request".into(),
                json!({ "productId": product_id.to_string() }).to_string(),
            );
            super::call(client, log, OP_INVENTORY_GET, extra).await?
        }
        ProductCommand::InventoryUpdate {
            product_id,
            sku_id,
            quantity,
            diff,
        } => {
            let inventory = if diff {
                json!({ "amountDiff": quantity.to_string() })
            } else {
                json!({ "amount": quantity.to_string() })
            };
            let mut extra = HashMap::new();
            extra.insert(
                "inventory_update_request".into(),
                json!({
                    "inventoryItems": [{
                        "productId": product_id.to_string(),
                        "skuId": sku_id.to_string(),
                        "inventory": inventory,
                    }]
                })
                .to_string(),
            );
            super::call(client, log, OP_INVENTORY_UPDATE, extra).await?
        }
    };
    super::emit(&body)
}
