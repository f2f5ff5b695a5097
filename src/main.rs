//! `resemble` entrypoint: one query against one JSON corpus, report on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;

use resemble::config::Config;
use resemble::corpus;
use resemble::gateway::{
    EmbeddingClient, GenerativeClient, ModelGateway, ModelKind, RelatednessClient, launcher_for,
};
use resemble::pipeline::{ModelBackends, Pipeline};
use resemble::report::{InMemoryReport, ReportSink};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let embedding = build_gateway(&config, ModelKind::Embedding)?;
    let relatedness = build_gateway(&config, ModelKind::Relatedness)?;
    let generative = build_gateway(&config, ModelKind::Generative)?;

    if std::env::args().any(|arg| arg == "--check-services") {
        let gateways = [&embedding, &relatedness, &generative];
        std::process::exit(check_services(&gateways).await);
    }

    let query = config.require_query()?;
    let corpus_path = std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .map(PathBuf::from)
        .or_else(|| config.corpus_path.clone())
        .context("no corpus given: pass a path or set RESEMBLE_CORPUS_PATH")?;
    let units = corpus::load(&corpus_path)?;

    tracing::info!(
        query,
        units = units.len(),
        rule = config.decision_rule().name(),
        top_k = config.top_k,
        "Resemble search starting"
    );

    let backends = ModelBackends {
        embedding: Arc::new(EmbeddingClient::new(Arc::clone(&embedding))),
        relatedness: Arc::new(RelatednessClient::new(Arc::clone(&relatedness))),
        generative: Arc::new(GenerativeClient::new(Arc::clone(&generative))),
    };
    let report = Arc::new(InMemoryReport::new());
    let sink: Arc<dyn ReportSink> = report.clone();
    let pipeline = Pipeline::new(config.pipeline_settings(query), backends, sink);

    let result = pipeline.run(&units).await;
    for gateway in [&embedding, &relatedness, &generative] {
        gateway.shutdown();
    }
    let outcome = result?;

    tracing::info!(
        run_id = %report.run_id(),
        matches = outcome.matches().count(),
        failures = outcome.failures.len(),
        "Resemble search complete"
    );

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report.snapshot())?;
    println!();
    Ok(())
}

fn build_gateway(config: &Config, kind: ModelKind) -> anyhow::Result<Arc<ModelGateway>> {
    let gateway = ModelGateway::with_launcher(
        config.gateway_config(kind),
        launcher_for(config.launch_command(kind)),
    )
    .with_context(|| format!("failed to build {kind} gateway"))?;
    Ok(Arc::new(gateway))
}

/// Probes every gateway once. Returns the process exit code.
async fn check_services(gateways: &[&Arc<ModelGateway>]) -> i32 {
    let mut all_live = true;
    for gateway in gateways {
        let live = gateway.is_live().await;
        all_live &= live;
        println!(
            "{:<12} {:<28} {}",
            gateway.kind(),
            gateway.config().base_url,
            if live { "live" } else { "DOWN" }
        );
    }
    if all_live { 0 } else { 1 }
}
