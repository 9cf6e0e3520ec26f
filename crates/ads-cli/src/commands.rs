//! Command execution
//!
//! A [`Runner`] turns one parsed [`Command`] into an [`Outcome`]: the
//! envelope to print and the process exit code. Every request command goes
//! through the same gate: build the request, lint it against the schema
//! pack, resolve credentials, then send.

use ads_core::RequestSpec;
use ads_lint::LintEngine;
use ads_schema::{SchemaPack, SchemaProvider};
use ads_transport::{
    CancelToken, Client, ClientConfig, PageOptions, Paging, RateLimitInfo, TransportError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::args::{DeleteArgs, GetArgs, GlobalArgs, LintArgs, PostArgs, SchemaCommand};
use crate::credentials::{CredentialResolver, EnvCredentialResolver};
use crate::output::Envelope;
use crate::tracking::{JsonlLedger, NoopSink, ResourceSink, TrackedResource};
use crate::{CliError, Command, EXIT_OK, Result};

/// Usage percentage at which a successful reply carries a throttling warning
const USAGE_WARNING_PERCENT: f64 = 75.0;

fn usage_warning(info: &RateLimitInfo) -> Option<String> {
    let peak = info.peak_usage()?;
    (peak >= USAGE_WARNING_PERCENT).then(|| {
        format!("Rate limit usage at {peak:.0}%; slow down before the API starts throttling")
    })
}

/// What a finished command prints and how the process exits
#[derive(Debug, Clone)]
pub struct Outcome {
    pub envelope: Envelope,
    pub exit_code: u8,
}

/// Successful command output before it is wrapped in an envelope
#[derive(Debug, Default)]
struct Reply {
    data: Value,
    paging: Option<Paging>,
    rate_limit: Option<RateLimitInfo>,
}

impl Reply {
    fn data(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

pub struct Runner {
    global: GlobalArgs,
    provider: SchemaProvider,
    credentials: Arc<dyn CredentialResolver>,
    sink: Arc<dyn ResourceSink>,
}

impl Runner {
    pub fn new(
        global: GlobalArgs,
        credentials: Arc<dyn CredentialResolver>,
        sink: Arc<dyn ResourceSink>,
    ) -> Self {
        let provider = SchemaProvider::new(&global.schema_dir);
        Self {
            global,
            provider,
            credentials,
            sink,
        }
    }

    /// Runner wired to the process environment and the `--ledger` file.
    pub fn from_global(global: GlobalArgs) -> Self {
        let sink: Arc<dyn ResourceSink> = match &global.ledger {
            Some(path) => Arc::new(JsonlLedger::new(path)),
            None => Arc::new(NoopSink),
        };
        Self::new(global, Arc::new(EnvCredentialResolver::new()), sink)
    }

    pub fn global(&self) -> &GlobalArgs {
        &self.global
    }

    /// Run `command` to completion. Failures become failure envelopes.
    ///
    /// With `--deadline`, `cancel` fires with
    /// [`CancelReason::DeadlineExceeded`](ads_transport::CancelReason) once
    /// the deadline passes.
    pub async fn execute(&self, command: &Command, cancel: &CancelToken) -> Outcome {
        let name = command.name();
        let mut warnings = Vec::new();

        let deadline = self.global.deadline.map(|secs| {
            debug!("Deadline for {}: {}s", name, secs);
            cancel.cancel_after(Duration::from_secs(secs))
        });
        let result = self.dispatch(command, cancel, &mut warnings).await;
        if let Some(timer) = deadline {
            timer.abort();
        }

        match result {
            Ok(reply) => {
                if let Some(warning) = reply.rate_limit.as_ref().and_then(usage_warning) {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
                Outcome {
                    envelope: Envelope::success(name, reply.data)
                        .with_paging(reply.paging)
                        .with_rate_limit(reply.rate_limit)
                        .with_warnings(warnings),
                    exit_code: EXIT_OK,
                }
            }
            Err(err) => {
                debug!("{} failed: {}", name, err);
                let rate_limit = match &err {
                    CliError::Transport(transport) => transport
                        .classified()
                        .and_then(|c| c.diagnostics.get("rate_limit"))
                        .and_then(|v| serde_json::from_value(v.clone()).ok()),
                    _ => None,
                };
                Outcome {
                    exit_code: err.exit_code(),
                    envelope: Envelope::failure(name, &err)
                        .with_rate_limit(rate_limit)
                        .with_warnings(warnings),
                }
            }
        }
    }

    async fn dispatch(
        &self,
        command: &Command,
        cancel: &CancelToken,
        warnings: &mut Vec<String>,
    ) -> Result<Reply> {
        match command {
            Command::Get(args) => self.get(args, cancel, warnings).await,
            Command::Post(args) => self.post(args, cancel, warnings).await,
            Command::Delete(args) => self.delete(args, cancel, warnings).await,
            Command::Lint(args) => self.lint(args, warnings),
            Command::Schema(SchemaCommand::List) => self.schema_list(),
            Command::Schema(SchemaCommand::Show { entity }) => self.schema_show(entity.as_deref()),
        }
    }

    async fn get(
        &self,
        args: &GetArgs,
        cancel: &CancelToken,
        warnings: &mut Vec<String>,
    ) -> Result<Reply> {
        let spec = args.to_spec()?;
        self.lint_gate(&spec, warnings)?;
        let client = self.client()?;

        if !args.follow {
            let response = client.execute(&spec, cancel).await?;
            return Ok(Reply {
                data: response.payload,
                paging: response.paging,
                rate_limit: response.rate_limit,
            });
        }

        let options = PageOptions { limit: args.limit };
        let paged = client.execute_paged(&spec, &options, cancel).await?;
        if paged.truncated {
            warnings.push(format!(
                "Results truncated after {} item(s) from {} page(s)",
                paged.data.len(),
                paged.pages
            ));
        }
        Ok(Reply {
            data: Value::Array(paged.data),
            paging: paged.paging,
            rate_limit: paged.rate_limit,
        })
    }

    async fn post(
        &self,
        args: &PostArgs,
        cancel: &CancelToken,
        warnings: &mut Vec<String>,
    ) -> Result<Reply> {
        let spec = args.to_spec()?;
        self.lint_gate(&spec, warnings)?;
        let client = self.client()?;
        let response = client.execute(&spec, cancel).await?;

        if let Some(resource) =
            TrackedResource::from_creation(&spec, &response.payload, &self.global.api_version)
        {
            info!("Created {} {}", resource.kind, resource.id);
            // the create already happened; report ledger failures as warnings
            if let Err(err) = self.sink.record(&resource) {
                warn!("Could not record {} {}: {}", resource.kind, resource.id, err);
                warnings.push(format!(
                    "Created {} {} but could not record it: {err}",
                    resource.kind, resource.id
                ));
            }
        }

        Ok(Reply {
            data: response.payload,
            paging: None,
            rate_limit: response.rate_limit,
        })
    }

    async fn delete(
        &self,
        args: &DeleteArgs,
        cancel: &CancelToken,
        warnings: &mut Vec<String>,
    ) -> Result<Reply> {
        let spec = args.to_spec()?;
        self.lint_gate(&spec, warnings)?;
        let client = self.client()?;
        let response = client.execute(&spec, cancel).await?;
        Ok(Reply {
            data: response.payload,
            paging: None,
            rate_limit: response.rate_limit,
        })
    }

    /// Offline check; never resolves credentials or opens a connection.
    fn lint(&self, args: &LintArgs, warnings: &mut Vec<String>) -> Result<Reply> {
        let spec = args.to_spec()?;
        let pack = self.pack()?;
        let result = LintEngine::new(self.global.strict).lint(&pack, &spec);
        warnings.extend(result.warning_messages());
        let clean = result.is_clean();
        result.into_result(&spec)?;

        Ok(Reply::data(json!({
            "request": describe(&spec),
            "endpoint": spec.endpoint_key(),
            "pack": pack.key().to_string(),
            "strict": self.global.strict,
            "clean": clean,
        })))
    }

    fn schema_list(&self) -> Result<Reply> {
        let versions = self.provider.list_versions(&self.global.domain)?;
        Ok(Reply::data(json!({
            "domain": self.global.domain,
            "versions": versions,
        })))
    }

    fn schema_show(&self, entity: Option<&str>) -> Result<Reply> {
        let pack = self.pack()?;
        let Some(entity) = entity else {
            return Ok(Reply::data(pack_value(&pack)));
        };

        let fields = pack
            .entity_fields(entity)
            .ok_or_else(|| CliError::UnknownEntity {
                entity: entity.to_string(),
                pack: pack.key().to_string(),
            })?;
        let endpoints: serde_json::Map<String, Value> = pack
            .endpoints_for(entity)
            .into_iter()
            .map(|key| {
                let params = pack.endpoint_params(key).unwrap_or_default();
                let deprecated = pack.deprecated_params(key).unwrap_or_default();
                (
                    key.to_string(),
                    json!({"params": params, "deprecated": deprecated}),
                )
            })
            .collect();

        Ok(Reply::data(json!({
            "pack": pack.key().to_string(),
            "entity": entity,
            "fields": fields,
            "endpoints": endpoints,
        })))
    }

    /// Lint `spec` before it is sent. Warnings never block; errors do.
    fn lint_gate(&self, spec: &RequestSpec, warnings: &mut Vec<String>) -> Result<()> {
        if self.global.skip_lint {
            warn!("Schema lint skipped for {} {}", spec.method(), spec.path());
            warnings.push("Schema lint skipped (--skip-lint)".to_string());
            return Ok(());
        }

        let pack = self.pack()?;
        let result = LintEngine::new(self.global.strict).lint(&pack, spec);
        for message in result.warning_messages() {
            warn!("{}", message);
            warnings.push(message);
        }
        result.into_result(spec)?;
        Ok(())
    }

    fn pack(&self) -> Result<Arc<SchemaPack>> {
        Ok(self
            .provider
            .get_pack(&self.global.domain, &self.global.api_version)?)
    }

    fn client(&self) -> Result<Client> {
        let credentials = self.credentials.resolve(self.global.profile.as_deref())?;

        let mut config = ClientConfig::new()
            .with_api_version(&self.global.api_version)
            .map_err(TransportError::from)?;
        if let Some(url) = &self.global.base_url {
            config = config.with_base_url(url).map_err(TransportError::from)?;
        }
        let mut config = config
            .with_max_retries(self.global.max_retries)
            .with_timeout(Duration::from_secs(self.global.timeout))
            .with_access_token(credentials.token.as_str());
        if let Some(secret) = &credentials.app_secret {
            config = config.with_app_secret(secret.as_str());
        }

        debug!("Client configured: {:?}", config);
        Ok(Client::new(config)?)
    }
}

fn describe(spec: &RequestSpec) -> Value {
    let params: serde_json::Map<String, Value> = spec
        .params()
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    json!({
        "method": spec.method().as_str(),
        "path": spec.path(),
        "fields": spec.fields(),
        "params": params,
    })
}

fn pack_value(pack: &SchemaPack) -> Value {
    serde_json::to_value(pack).unwrap_or(Value::Null)
}
