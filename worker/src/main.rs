use anyhow::Result;
use clap::Parser;
use common::{workload_by_name, WorkerConfig};
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use worker::{HttpCoordinator, Worker};

/// Worker MapReduce: pide tareas al master hasta que el job termina.
#[derive(Parser, Debug)]
#[command(name = "worker")]
struct Args {
    /// Aplicación a ejecutar (wc | indexer)
    #[arg(long, env = "MR_APP", default_value = "wc")]
    app: String,

    /// En Docker: MASTER_URL=http://master:8080
    #[arg(long, env = "MASTER_URL", default_value = "http://localhost:8080")]
    master_url: String,

    /// Directorio compartido donde quedan intermedios y salidas
    #[arg(long, env = "MR_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Pausa entre pedidos de trabajo
    #[arg(long, env = "MR_POLL_INTERVAL_MS", default_value_t = 50)]
    poll_interval_ms: u64,

    /// Fallos seguidos de Schedule tras los cuales se asume que el master se fue
    #[arg(long, env = "MR_MAX_SCHEDULE_FAILURES", default_value_t = 10)]
    max_schedule_failures: u32,

    /// Espera máxima por los intermedios de un reduce antes de devolver la tarea
    #[arg(long, env = "MR_INPUT_WAIT_MS", default_value_t = 5_000)]
    input_wait_ms: u64,
}

async fn run(args: Args) -> Result<()> {
    let workload = workload_by_name(&args.app)?;

    // Nombre de host (solo para info)
    let host = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    info!(
        "worker en {} contra {} (app={}, salida={})",
        host,
        args.master_url,
        args.app,
        args.output_dir.display()
    );

    let config = WorkerConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        output_dir: args.output_dir,
        max_schedule_failures: args.max_schedule_failures.max(1),
        input_wait: Duration::from_millis(args.input_wait_ms),
    };

    let mut worker = Worker::new(HttpCoordinator::new(args.master_url), workload, config);
    let summary = worker.run().await?;

    info!(
        "worker {:?} terminó: {} maps, {} reduces, {} descartadas",
        summary.worker_id, summary.maps_committed, summary.reduces_committed, summary.discarded
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("worker=info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("worker abortado: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
