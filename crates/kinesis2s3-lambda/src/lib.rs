// AWS Lambda runtime adapter
//
// Uses OpenDAL S3 for storage and handles Kinesis trigger events.
// The tokio runtime is the one lambda_runtime already depends on.

use kinesis2s3_config::RuntimeConfig;
use kinesis2s3_core::{ArchiveError, KinesisEvent};
use kinesis2s3_writer::{initialize_storage, Archiver, ObjectStore};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;

mod handlers;
mod init;

pub use handlers::{AggregateCount, AggregateSummary};
pub use init::init_tracing;

/// Which of the Kinesis handlers a binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Hour-partitioned archive to object storage
    Archive,
    /// Per-(plid, exchange) tally
    Aggregate,
    /// Decode and log every payload
    DecodeLog,
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Archive => "archive",
            Handler::Aggregate => "aggregate",
            Handler::DecodeLog => "decode-log",
        }
    }
}

impl std::str::FromStr for Handler {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "archive" => Ok(Handler::Archive),
            "aggregate" => Ok(Handler::Aggregate),
            "decode-log" | "decode_log" => Ok(Handler::DecodeLog),
            _ => anyhow::bail!(
                "Unknown handler: {}. Supported: archive, aggregate, decode-log",
                s
            ),
        }
    }
}

/// What a handler carries between invocations
enum Mode {
    Archive(Archiver),
    Aggregate,
    DecodeLog,
}

/// Built once per cold start and shared across invocations
pub struct HandlerState {
    config: RuntimeConfig,
    mode: Mode,
}

impl HandlerState {
    /// Build state for `handler`, opening storage from the config if needed.
    pub fn new(handler: Handler, config: RuntimeConfig) -> anyhow::Result<Self> {
        let mode = match handler {
            Handler::Archive => {
                // OpenDAL discovers AWS credentials from the execution role
                let operator = initialize_storage(&config.storage)?;
                tracing::info!(
                    backend = %config.storage.backend,
                    bucket_path = %config.storage.bucket_path,
                    trigger_enabled = config.trigger.enabled,
                    "Archive storage ready"
                );
                Mode::Archive(Archiver::from_config(Arc::new(operator), &config))
            }
            Handler::Aggregate => Mode::Aggregate,
            Handler::DecodeLog => Mode::DecodeLog,
        };
        Ok(Self { config, mode })
    }

    /// Archive state around an already constructed store.
    pub fn with_store(config: RuntimeConfig, store: Arc<dyn ObjectStore>) -> Self {
        let archiver = Archiver::from_config(store, &config);
        Self {
            config,
            mode: Mode::Archive(archiver),
        }
    }

    pub fn handler(&self) -> Handler {
        match self.mode {
            Mode::Archive(_) => Handler::Archive,
            Mode::Aggregate => Handler::Aggregate,
            Mode::DecodeLog => Handler::DecodeLog,
        }
    }

    /// Run the handler over one delivered event.
    pub async fn invoke(&self, event: &KinesisEvent) -> Result<serde_json::Value, ArchiveError> {
        match &self.mode {
            Mode::Archive(archiver) => handlers::archive(event, archiver)
                .await
                .map(serde_json::Value::from),
            Mode::Aggregate => handlers::aggregate(event, &self.config)
                .await
                .map(|summary| serde_json::json!(summary)),
            Mode::DecodeLog => {
                handlers::decode_log(event, &self.config).map(serde_json::Value::from)
            }
        }
    }
}

/// Lambda runtime entry point
pub async fn run(handler: Handler) -> Result<(), Error> {
    // Storage settings only matter to the archive handler
    let config = match handler {
        Handler::Archive => RuntimeConfig::load(),
        Handler::Aggregate | Handler::DecodeLog => RuntimeConfig::load_unvalidated(None),
    }
    .map_err(|e| Error::from(format!("Failed to load configuration: {:#}", e)))?;
    init_tracing(&config.logging);

    tracing::info!(
        handler = handler.name(),
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        "Starting Kinesis handler"
    );

    let state = Arc::new(
        HandlerState::new(handler, config)
            .map_err(|e| Error::from(format!("Failed to initialize handler: {:#}", e)))?,
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<KinesisEvent>| {
        let state = state.clone();
        async move { handle_event(event, &state).await }
    }))
    .await
}

async fn handle_event(
    event: LambdaEvent<KinesisEvent>,
    state: &HandlerState,
) -> Result<serde_json::Value, Error> {
    let (event, context) = event.into_parts();
    tracing::debug!(
        request_id = %context.request_id,
        records = event.len(),
        "Handling Kinesis event"
    );

    state.invoke(&event).await.map_err(|err| {
        tracing::error!(
            handler = state.handler().name(),
            error_type = err.error_type(),
            retryable = err.is_retryable(),
            "{}",
            err
        );
        Error::from(err)
    })
}
