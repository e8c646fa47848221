use crate::config::{LogFormat, ServiceConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gpu-inference-api")]
#[command(about = "GPU inference API service and its AWS deployment plan")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the inference HTTP service
    Serve(ServeArgs),
    /// Probe a running service's health endpoint (container health check)
    Healthcheck(HealthcheckArgs),
    /// Validate a stack configuration and print its deployment plan
    Plan(PlanArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Override HOST
    #[arg(long)]
    pub host: Option<String>,

    /// Override PORT
    #[arg(long)]
    pub port: Option<u16>,

    /// Override MODEL_DIR
    #[arg(long)]
    pub model_dir: Option<String>,

    /// Emit JSON logs (CloudWatch friendly)
    #[arg(long)]
    pub json_logs: bool,

    /// Include process CPU/memory stats in /metrics
    #[arg(long)]
    pub monitor: bool,
}

impl ServeArgs {
    /// 套用命令列覆蓋設定
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.model_dir {
            config.model_dir = Some(dir.clone());
        }
        if self.json_logs {
            config.log_format = LogFormat::Json;
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct HealthcheckArgs {
    #[arg(long, default_value = "http://localhost:8080/health")]
    pub url: String,

    #[arg(long, default_value = "5")]
    pub timeout_secs: u64,

    /// Accepted status codes, target-group syntax
    #[arg(long, default_value = "200-299")]
    pub matcher: String,
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Path to the stack TOML file; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override stack.environment
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Print creation waves instead of the full plan
    #[arg(long, conflicts_with = "outputs")]
    pub waves: bool,

    /// Print stack outputs instead of the full plan
    #[arg(long)]
    pub outputs: bool,

    /// JSON object of `resource.attribute` values used to resolve outputs
    #[arg(long, requires = "outputs")]
    pub resolve: Option<PathBuf>,
}
