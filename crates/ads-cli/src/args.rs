//! Command-line arguments

use ads_core::{HttpMethod, RequestSpec};
use ads_transport::config::{DEFAULT_API_VERSION, DEFAULT_MAX_RETRIES};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Schema-linted client for the ads API
///
/// Requests are checked against a versioned schema pack before they are
/// sent. Failures are classified with remediation guidance.
#[derive(Parser, Debug)]
#[command(name = "ads", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Credential profile; selects ADS_<PROFILE>_ACCESS_TOKEN
    #[arg(long, global = true, env = "ADS_PROFILE")]
    pub profile: Option<String>,

    /// Schema domain
    #[arg(long, global = true, env = "ADS_DOMAIN", default_value = "marketing")]
    pub domain: String,

    /// API version, also selects the schema pack
    #[arg(long, global = true, env = "ADS_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Root of the schema pack tree (<dir>/<domain>/<version>.json)
    #[arg(long, global = true, env = "ADS_SCHEMA_DIR", default_value = "schemas")]
    pub schema_dir: PathBuf,

    /// Treat unknown fields and params as errors
    #[arg(long, global = true, env = "ADS_STRICT")]
    pub strict: bool,

    /// Send requests without checking them against the schema pack
    #[arg(long, global = true, env = "ADS_SKIP_LINT")]
    pub skip_lint: bool,

    /// Retries for rate-limited and transient failures
    #[arg(long, global = true, env = "ADS_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Per-attempt HTTP timeout in seconds
    #[arg(long, global = true, env = "ADS_TIMEOUT", value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,

    /// Overall deadline in seconds, covering every attempt, backoff and page
    #[arg(long, global = true, env = "ADS_DEADLINE", value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Output format
    #[arg(long, global = true, env = "ADS_FORMAT", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// API host override
    #[arg(long, global = true, env = "ADS_BASE_URL")]
    pub base_url: Option<String>,

    /// Append created resources to this JSONL ledger
    #[arg(long, global = true, env = "ADS_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Verbose logging on stderr (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read an object or list a collection
    Get(GetArgs),

    /// Create an object or update an existing one
    Post(PostArgs),

    /// Delete an object
    Delete(DeleteArgs),

    /// Check a request against the schema pack without sending it
    Lint(LintArgs),

    /// Inspect schema packs
    #[command(subcommand)]
    Schema(SchemaCommand),
}

impl Command {
    /// Name reported in the output envelope.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get(_) => "get",
            Self::Post(_) => "post",
            Self::Delete(_) => "delete",
            Self::Lint(_) => "lint",
            Self::Schema(SchemaCommand::List) => "schema list",
            Self::Schema(SchemaCommand::Show { .. }) => "schema show",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// API path, e.g. act_123/campaigns
    pub path: String,

    /// Comma-separated read fields
    #[arg(long, short = 'f', value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Query parameter (repeatable)
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Follow paging.next and collect every page
    #[arg(long)]
    pub follow: bool,

    /// Stop following after this many items
    #[arg(long, requires = "follow")]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    /// API path, e.g. act_123/adsets or an object id
    pub path: String,

    /// Form parameter (repeatable)
    #[arg(
        long = "param",
        short = 'p',
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        required = true
    )]
    pub params: Vec<(String, String)>,

    /// Fields to return for the written object
    #[arg(long, short = 'f', value_delimiter = ',')]
    pub fields: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Object id or edge path
    pub path: String,

    /// Form parameter (repeatable)
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub struct LintArgs {
    /// HTTP method: get, post or delete
    #[arg(value_parser = parse_method)]
    pub method: HttpMethod,

    /// API path
    pub path: String,

    #[arg(long, short = 'f', value_delimiter = ',')]
    pub fields: Vec<String>,

    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SchemaCommand {
    /// List installed pack versions for the domain
    List,

    /// Show the pack for --api-version, or one entity of it
    Show {
        #[arg(long)]
        entity: Option<String>,
    },
}

impl GetArgs {
    pub fn to_spec(&self) -> ads_core::Result<RequestSpec> {
        build_spec(HttpMethod::Get, &self.path, &self.fields, &self.params)
    }
}

impl PostArgs {
    pub fn to_spec(&self) -> ads_core::Result<RequestSpec> {
        build_spec(HttpMethod::Post, &self.path, &self.fields, &self.params)
    }
}

impl DeleteArgs {
    pub fn to_spec(&self) -> ads_core::Result<RequestSpec> {
        build_spec(HttpMethod::Delete, &self.path, &[], &self.params)
    }
}

impl LintArgs {
    pub fn to_spec(&self) -> ads_core::Result<RequestSpec> {
        build_spec(self.method, &self.path, &self.fields, &self.params)
    }
}

fn build_spec(
    method: HttpMethod,
    path: &str,
    fields: &[String],
    params: &[(String, String)],
) -> ads_core::Result<RequestSpec> {
    let fields = ads_core::parse_fields(&fields.join(","));
    Ok(RequestSpec::new(method, path)?
        .with_fields(fields)
        .with_params(params.iter().cloned()))
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    ads_core::parse_param(input).map_err(|e| e.to_string())
}

fn parse_method(input: &str) -> Result<HttpMethod, String> {
    input.parse::<HttpMethod>().map_err(|e| e.to_string())
}
