use anyhow::{Context, Result};
use clap::Parser;
use common::SchedulerConfig;
use glob::glob;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use master::{build_router, AppState, Scheduler};

/// Coordinador MapReduce: reparte tareas map/reduce a los workers que piden trabajo.
#[derive(Parser, Debug)]
#[command(name = "master")]
struct Args {
    /// Archivos de entrada; se aceptan patrones glob (ej: "data/pg-*.txt")
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<String>,

    /// Cantidad de tareas reduce (R)
    #[arg(long, env = "MR_REDUCE_TASKS", default_value_t = 10)]
    reduce_tasks: u32,

    /// Tiempo sin reporte tras el cual una tarea se reasigna
    #[arg(long, env = "MR_TASK_TIMEOUT_MS", default_value_t = 10_000)]
    task_timeout_ms: u64,

    /// Máximo que un Schedule espera en el master si no hay tarea libre
    #[arg(long, env = "MR_SCHEDULE_WAIT_MS", default_value_t = 2_000)]
    schedule_wait_ms: u64,

    #[arg(long, env = "MR_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Cuánto seguir atendiendo tras terminar, para que los workers vean is_finished
    #[arg(long, env = "MR_LINGER_MS", default_value_t = 3_000)]
    linger_ms: u64,
}

// Cada argumento se expande como glob; el orden define el índice de cada split
fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let before = files.len();
        for entry in glob(pattern).with_context(|| format!("patrón inválido: {pattern}"))? {
            let path = entry?;
            if path.is_file() {
                files.push(path.to_string_lossy().to_string());
            }
        }
        if files.len() == before {
            warn!("'{}' no coincide con ningún archivo", pattern);
        }
    }

    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("master=info,tower_http=info,axum=info")),
        )
        .init();

    let args = Args::parse();
    let inputs = expand_inputs(&args.inputs)?;

    let config = SchedulerConfig {
        task_timeout: Duration::from_millis(args.task_timeout_ms),
        schedule_wait: Duration::from_millis(args.schedule_wait_ms),
    };
    info!(
        "job con {} archivos de entrada, R={}, timeout de tarea {:?}",
        inputs.len(),
        args.reduce_tasks,
        config.task_timeout
    );

    let state = AppState::new(Scheduler::new(inputs, args.reduce_tasks, config));
    let app = build_router(state.clone());

    let scheduler = state.scheduler.clone();
    let linger = Duration::from_millis(args.linger_ms);
    let shutdown = async move {
        tokio::select! {
            _ = scheduler.wait_done() => {
                info!("job terminado; se sigue atendiendo {:?} antes de salir", linger);
                tokio::time::sleep(linger).await;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("ctrl-c recibido, apagando el master");
            }
        }
    };

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", args.listen))?;
    info!("master escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("master apagado");
    Ok(())
}
