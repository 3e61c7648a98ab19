//! CLI argument parsing with clap

use clap::{ArgAction, Args, Parser, Subcommand};
use s3_operator_core::config::DEFAULT_BACKEND;
use s3_operator_core::{OperatorConfig, DEFAULT_ANNOTATION_KEY, DEFAULT_REGION};
use std::path::PathBuf;
use std::time::Duration;

/// S3 operator - provisions storage users and buckets from annotated secrets
#[derive(Parser, Debug)]
#[command(name = "s3-operator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log level when no -v/-q flag is given (DEBUG, INFO, WARNING, ERROR)
    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub operator: OperatorArgs,

    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the operator until SIGTERM or Ctrl+C
    Run,

    /// Test backend connectivity and exit
    Check,

    /// Reconcile every marked secret once and exit
    Sync,
}

#[derive(Args, Debug, Clone)]
pub struct OperatorArgs {
    /// S3 endpoint URL of the managed storage system
    #[arg(long, env = "S3_ENDPOINT_URL", global = true)]
    pub s3_endpoint_url: Option<String>,

    /// Root access key for the storage backend
    #[arg(long, env = "ROOT_ACCESS_KEY", hide_env_values = true, global = true)]
    pub root_access_key: Option<String>,

    /// Root secret key for the storage backend
    #[arg(long, env = "ROOT_SECRET_KEY", hide_env_values = true, global = true)]
    pub root_secret_key: Option<String>,

    /// Backend type (versitygw, minio, garage)
    #[arg(long, env = "BACKEND_NAME", default_value = DEFAULT_BACKEND, global = true)]
    pub backend_name: String,

    /// Annotation key that marks a secret as managed
    #[arg(long, env = "ANNOTATION_KEY", default_value = DEFAULT_ANNOTATION_KEY, global = true)]
    pub annotation_key: String,

    /// Skip secrets whose endpoint differs from the configured one
    #[arg(
        long,
        env = "ENFORCE_ENDPOINT_CHECK",
        default_value_t = true,
        action = ArgAction::Set,
        global = true
    )]
    pub enforce_endpoint_check: bool,

    /// Region used for request signing
    #[arg(long, env = "S3_REGION", default_value = DEFAULT_REGION, global = true)]
    pub region: String,

    /// Timeout for a single backend request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub request_timeout_secs: u64,

    /// Interval between full resync passes, in seconds
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value_t = 300, global = true)]
    pub resync_interval_secs: u64,

    /// Lifetime of a single watch session, in seconds
    #[arg(long, env = "WATCH_TIMEOUT_SECS", default_value_t = 300, global = true)]
    pub watch_timeout_secs: u64,

    /// Port for the metrics and health endpoints
    #[arg(long, env = "METRICS_PORT", default_value_t = 8000, global = true)]
    pub metrics_port: u16,

    /// Path to a kubeconfig file (kubectl defaults otherwise)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// kubectl binary used to read secrets
    #[arg(long, env = "KUBECTL_BIN", default_value = "kubectl", global = true)]
    pub kubectl: String,
}

impl OperatorArgs {
    /// Build the operator configuration. Validation happens separately.
    pub fn to_config(&self) -> OperatorConfig {
        OperatorConfig {
            endpoint_url: self.s3_endpoint_url.clone().unwrap_or_default(),
            root_access_key: self.root_access_key.clone().unwrap_or_default(),
            root_secret_key: self.root_secret_key.clone().unwrap_or_default(),
            backend_name: self.backend_name.trim().to_lowercase(),
            annotation_key: self.annotation_key.clone(),
            enforce_endpoint: self.enforce_endpoint_check,
            region: self.region.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            resync_interval: Duration::from_secs(self.resync_interval_secs),
            watch_timeout: Duration::from_secs(self.watch_timeout_secs),
            metrics_port: self.metrics_port,
            kubeconfig: self.kubeconfig.clone(),
            kubectl: self.kubectl.clone(),
        }
    }
}
