use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command line interface for the ICBU open platform gateway.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional path to a configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for response logs (default: api_logs)
    #[arg(long)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorization and token lifecycle
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Product catalog operations
    #[command(subcommand)]
    Product(ProductCommand),
    /// Category tree operations
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Product schema operations
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// Photobank (image library) operations
    #[command(subcommand)]
    Photobank(PhotobankCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Print the browser authorization URL, or extract the code from a
    /// redirect URL pasted back after authorizing
    Authorize {
        /// Redirect URL received after authorizing in the browser
        #[arg(long)]
        redirect_response: Option<String>,
        /// Dotenv-style file to write the extracted AUTH_CODE into
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Exchange the authorization code for tokens (OAuth endpoint)
    CreateToken {
        /// Authorization code; falls back to the configured AUTH_CODE
        #[arg(long)]
        code: Option<String>,
        /// Dotenv-style file to persist the returned tokens into
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Exchange the authorization code through the legacy TOP router
    /// (MD5-signed `taobao.top.auth.token.create`)
    CreateTokenLegacy {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Refresh the access token (signed `/auth/token/refresh`)
    RefreshToken {
        #[arg(long)]
        env_file: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Listing filter (e.g. onSelling, auditing, editingRequired)
    #[arg(long, default_value = "onSelling")]
    pub filter_type: String,
    #[arg(long, default_value_t = 1)]
    pub current_page: u32,
    #[arg(long, default_value_t = 20)]
    pub page_size: u32,
    /// Match against the product subject
    #[arg(long)]
    pub subject: Option<String>,
    /// Modification window start (yyyy-MM-dd HH:mm:ss)
    #[arg(long)]
    pub gmt_modified_from: Option<String>,
    /// Modification window end (yyyy-MM-dd HH:mm:ss)
    #[arg(long)]
    pub gmt_modified_to: Option<String>,
    #[arg(long)]
    pub group_id1: Option<i64>,
    #[arg(long)]
    pub group_id2: Option<i64>,
    #[arg(long)]
    pub group_id3: Option<i64>,
    /// Restrict to a single product id
    #[arg(long)]
    pub id: Option<i64>,
    #[arg(long)]
    pub category_id: Option<i64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Product is for sale
    Online,
    /// Product is withdrawn from sale
    Offline,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductCommand {
    /// Fetch full details for one product
    Get {
        #[arg(long)]
        product_id: i64,
    },
    /// List products, one page
    List(ListArgs),
    /// List products across all pages, pacing requests between pages
    ListAll(ListArgs),
    /// Put a product on or off the shelf
    UpdateDisplay {
        #[arg(long)]
        product_id: i64,
        #[arg(long, value_enum)]
        status: DisplayStatus,
    },
    /// Fetch the quality score of a product
    Score {
        #[arg(long)]
        product_id: i64,
    },
    /// Check whether a product is available for ordering
    Available {
        #[arg(long)]
        product_id: i64,
    },
    /// Convert between plain and encrypted product ids
    EncryptId {
        #[arg(long)]
        product_id: String,
        /// 1: plain to encrypted, 2: encrypted to plain
        #[arg(long, default_value_t = 1)]
        convert_type: u8,
    },
    /// Add a product to a display group
    GroupAdd {
        #[arg(long)]
        product_id: i64,
        #[arg(long)]
        group_id: i64,
    },
    /// Fetch SKU inventory for a product
    InventoryGet {
        #[arg(long)]
        product_id: i64,
    },
    /// Set or adjust SKU inventory
    InventoryUpdate {
        #[arg(long)]
        product_id: i64,
        #[arg(long)]
        sku_id: i64,
        #[arg(long, allow_hyphen_values = true)]
        quantity: i64,
        /// Treat quantity as a relative adjustment instead of an absolute amount
        #[arg(long)]
        diff: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// Fetch a category node (0 = root)
    Get {
        #[arg(long, default_value_t = 0)]
        cat_id: i64,
    },
    /// Map between category/attribute id namespaces
    IdMapping {
        #[arg(long)]
        convert_type: Option<u8>,
        #[arg(long)]
        cat_id: Option<i64>,
        #[arg(long)]
        attribute_id: Option<i64>,
        #[arg(long)]
        attribute_value_id: Option<i64>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SchemaCommand {
    /// Fetch the publishing schema for a category
    Get {
        #[arg(long)]
        cat_id: i64,
        #[arg(long)]
        schema_id: Option<String>,
    },
    /// Fetch the level schema for a category
    LevelGet {
        #[arg(long)]
        cat_id: i64,
        #[arg(long, default_value = "en_US")]
        language: String,
    },
    /// Submit a schema draft from a JSON file
    AddDraft {
        #[arg(long)]
        cat_id: i64,
        /// Path to a JSON document with the schema payload
        #[arg(long)]
        file: String,
    },
    /// Render a previously submitted draft
    RenderDraft {
        #[arg(long)]
        draft_id: String,
        #[arg(long)]
        language: Option<String>,
    },
    /// Update a published schema from a JSON file
    Update {
        #[arg(long)]
        schema_id: String,
        #[arg(long)]
        file: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PhotoPageArgs {
    #[arg(long, default_value_t = 1)]
    pub current_page: u32,
    #[arg(long, default_value_t = 20)]
    pub page_size: u32,
    #[arg(long)]
    pub gmt_create_start: Option<String>,
    #[arg(long)]
    pub gmt_create_end: Option<String>,
    #[arg(long)]
    pub gmt_modified_start: Option<String>,
    #[arg(long)]
    pub gmt_modified_end: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperation {
    Create,
    Update,
    Delete,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PhotobankCommand {
    /// List images in the photobank
    List {
        #[arg(long)]
        group_id: Option<i64>,
        #[command(flatten)]
        page: PhotoPageArgs,
    },
    /// List photobank groups
    GroupList {
        #[command(flatten)]
        page: PhotoPageArgs,
    },
    /// Create, rename or delete a photobank group
    GroupOperate {
        #[arg(long, value_enum)]
        operation: GroupOperation,
        /// Required for update and delete
        #[arg(long)]
        group_id: Option<i64>,
        /// Required for create and update
        #[arg(long)]
        group_name: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Upload an image file into the photobank
    Upload {
        #[arg(long)]
        file: String,
        #[arg(long)]
        group_id: Option<i64>,
        /// Name stored with the image; defaults to the file name
        #[arg(long)]
        image_name: Option<String>,
    },
}
