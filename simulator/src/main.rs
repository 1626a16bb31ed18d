use anyhow::Context;
use backend::server;
use canopycore::model::DetectionMode;
use clap::{Parser, ValueEnum};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::BackendConfig;
use workflow::runner::Runner;

mod backend;
mod generator;
mod workflow;

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Deforestation,
    Water,
    Biodiversity,
    Carbon,
}

impl From<ModeArg> for DetectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Deforestation => DetectionMode::Deforestation,
            ModeArg::Water => DetectionMode::Water,
            ModeArg::Biodiversity => DetectionMode::Biodiversity,
            ModeArg::Carbon => DetectionMode::Carbon,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Mock analysis backend for the Canopy Watch dashboard")]
struct Args {
    /// Generate one analysis offline and write a JSON report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Detection mode used by the offline run
    #[arg(long, value_enum, default_value_t = ModeArg::Deforestation)]
    mode: ModeArg,
    /// Load the backend config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,
    #[arg(long, default_value_t = 10)]
    sites: usize,
    #[arg(long)]
    seed: Option<u64>,
    /// Artificial delay before each area analysis answer
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
    /// Serve the HTTP endpoints until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let backend_config = if let Some(path) = args.workflow {
        BackendConfig::load(path)?
    } else {
        BackendConfig::from_args(args.bind, args.sites, args.seed, args.latency_ms)
    };

    let runner = Arc::new(Runner::new(backend_config.clone()));
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    if args.offline {
        let mode = DetectionMode::from(args.mode);
        let result = runtime
            .block_on(runner.execute_offline(mode))
            .context("running offline analysis")?;

        println!(
            "Offline run -> {} sites ({} high / {} medium / {} low)",
            result.total_sites, result.high_risk, result.medium_risk, result.low_risk
        );

        let report = serde_json::to_string_pretty(&result).context("serializing report")?;
        let report_path = &backend_config.report_path;
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(report_path, report)
            .with_context(|| format!("writing report {}", report_path.display()))?;
        log::info!("offline report written to {}", report_path.display());
    }
    if args.serve {
        runtime.block_on(async {
            let (_, server) = server::bind(runner.clone(), backend_config.bind, async {
                if let Err(err) = signal::ctrl_c().await {
                    log::warn!("awaiting Ctrl+C failed: {}", err);
                }
            })?;
            println!("Mock backend running on {} (Ctrl+C to stop)...", backend_config.bind);
            server.await;
            Ok::<(), anyhow::Error>(())
        })?;
        let metrics = runner.metrics();
        log::info!(
            "served {} analyses ({} ok, {} failed)",
            metrics.issued,
            metrics.applied,
            metrics.failed
        );
    }

    Ok(())
}
