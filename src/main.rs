use clap::Parser;
use gpu_inference_api::config::cli::{Cli, Command, HealthcheckArgs, PlanArgs, ServeArgs};
use gpu_inference_api::config::LogFormat;
use gpu_inference_api::core::topology::health::StatusMatcher;
use gpu_inference_api::core::topology::outputs::resolve_outputs;
use gpu_inference_api::domain::ports::ModelStore;
use gpu_inference_api::utils::monitor::ProcessMonitor;
use gpu_inference_api::utils::{logger, validation::Validate};
use gpu_inference_api::{
    ApiError, AppState, HealthProbe, LocalModelStore, Plan, RequestMetrics, Result,
    ServiceConfig, StackConfig,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(args) => run_serve(args, cli.verbose).await,
        Command::Healthcheck(args) => {
            logger::init_cli_logger(cli.verbose);
            // 容器健康檢查只認 0 (healthy) 與 1 (unhealthy)
            if let Err(e) = run_healthcheck(args).await {
                report(&e);
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Plan(args) => {
            logger::init_cli_logger(cli.verbose);
            run_plan(args)
        }
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(e.exit_code().max(1));
    }
}

fn report(e: &ApiError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
}

async fn run_serve(args: ServeArgs, verbose: bool) -> Result<()> {
    // 環境變數先讀，再套用命令列覆蓋
    let mut config =
        ServiceConfig::from_env().inspect_err(|_| logger::init_cli_logger(verbose))?;
    args.apply(&mut config);

    match config.log_format {
        LogFormat::Json => logger::init_container_logger(verbose),
        LogFormat::Compact => logger::init_cli_logger(verbose),
    }

    if verbose {
        tracing::debug!("Service config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    if args.monitor {
        tracing::info!("🔍 Process monitoring enabled");
    }
    let metrics = RequestMetrics::new(ProcessMonitor::new(args.monitor));

    let mut state = AppState::new(config.clone()).with_metrics(metrics);
    if let Some(store) = model_store(&config).await {
        state = state.with_store(store);
    }

    gpu_inference_api::serve(state).await
}

async fn model_store(config: &ServiceConfig) -> Option<Arc<dyn ModelStore>> {
    if let Some(dir) = &config.model_dir {
        return Some(Arc::new(LocalModelStore::new(dir)));
    }

    #[cfg(feature = "s3")]
    {
        if !config.model_bucket.is_empty() {
            let store = gpu_inference_api::S3ModelStore::from_region(
                config.model_bucket.clone(),
                config.region.clone(),
            )
            .await;
            return Some(Arc::new(store));
        }
    }

    None
}

async fn run_healthcheck(args: HealthcheckArgs) -> Result<()> {
    let matcher = StatusMatcher::parse(&args.matcher)?;
    let probe = HealthProbe::new(Duration::from_secs(args.timeout_secs))?.with_matcher(matcher);

    probe.check(&args.url).await?;
    tracing::info!("✅ {} is healthy", args.url);
    println!("healthy");
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("📄 Loading stack configuration from {}", path.display());
            StackConfig::from_file(path)?
        }
        None => {
            tracing::info!("📄 Using built-in stack defaults");
            StackConfig::default()
        }
    };
    if let Some(environment) = &args.environment {
        config.stack.environment = environment.clone();
    }

    let plan = Plan::build(&config)?;
    tracing::info!(
        "✅ Plan for {}/{} has {} resources and {} outputs",
        plan.project,
        plan.stack,
        plan.len(),
        plan.outputs.len()
    );

    let rendered = if args.waves {
        let waves = plan
            .waves()?
            .into_iter()
            .map(|wave| wave.into_iter().map(|r| r.name.clone()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        json!(waves)
    } else if args.outputs {
        match &args.resolve {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let values: HashMap<String, String> = serde_json::from_str(&content)?;
                let resolved = resolve_outputs(&plan.outputs, &values)?;
                Value::Object(resolved.into_iter().collect::<Map<_, _>>())
            }
            None => Value::Object(
                plan.outputs
                    .iter()
                    .map(|o| (o.name.clone(), o.value.clone()))
                    .collect(),
            ),
        }
    } else {
        serde_json::to_value(&plan)?
    };

    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
