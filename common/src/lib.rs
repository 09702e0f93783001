pub mod config;
pub mod engine;
pub mod indexer;
pub mod job;
pub mod store;
pub mod task;
pub mod wordcount;
pub mod worker;

pub use config::{SchedulerConfig, WorkerConfig};
pub use engine::{ihash, KeyValue, MapFn, ReduceFn, Workload};
pub use job::JobPhase;
pub use task::{TaskAssignment, TaskKind};
pub use worker::{
    CollectRequest, CollectResponse, ScheduleRequest, ScheduleResponse, WorkerId,
};

/// Busca una aplicación MapReduce por nombre ("wc", "indexer").
pub fn workload_by_name(name: &str) -> anyhow::Result<Workload> {
    match name {
        "wc" | "wordcount" => Ok(wordcount::workload()),
        "indexer" => Ok(indexer::workload()),
        other => anyhow::bail!("aplicación desconocida: {other} (disponibles: wc, indexer)"),
    }
}
