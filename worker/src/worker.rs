use common::{
    engine, store, store::PendingCommit, CollectRequest, ScheduleRequest, TaskAssignment,
    TaskKind, WorkerConfig, WorkerId, Workload,
};
use std::{io, path::Path};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::Coordinator;
use crate::error::WorkerError;

/// Qué pasó con una tarea ejecutada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// El master aceptó y los archivos quedaron con su nombre final
    Committed,
    /// El master rechazó (o no se pudo reportar); los temporales se borraron
    Discarded,
    /// Los intermedios del reduce no aparecieron a tiempo; no se reportó nada
    /// y el master la vuelve a entregar en el próximo Schedule
    Deferred,
}

/// Resumen de una corrida completa del worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub worker_id: Option<WorkerId>,
    pub maps_committed: u32,
    pub reduces_committed: u32,
    pub discarded: u32,
    pub deferred: u32,
}

/// Worker secuencial: pide una tarea, la ejecuta, la reporta, duerme y repite.
pub struct Worker<C> {
    coordinator: C,
    workload: Workload,
    config: WorkerConfig,
    id: Option<WorkerId>,
}

impl<C: Coordinator> Worker<C> {
    pub fn new(coordinator: C, workload: Workload, config: WorkerConfig) -> Self {
        Self {
            coordinator,
            workload,
            config,
            id: None,
        }
    }

    /// Identidad asignada por el master (None hasta el primer Schedule).
    pub fn id(&self) -> Option<WorkerId> {
        self.id
    }

    /// Loop principal. Termina con Ok cuando el master avisa `is_finished`.
    pub async fn run(&mut self) -> Result<RunSummary, WorkerError> {
        let mut summary = RunSummary::default();
        let mut failures: u32 = 0;

        loop {
            let req = ScheduleRequest { worker_id: self.id };

            let resp = match self.coordinator.schedule(req).await {
                Ok(resp) => {
                    failures = 0;
                    resp
                }
                Err(err) => {
                    let Some(id) = self.id else {
                        return Err(WorkerError::CoordinatorUnreachable(err));
                    };

                    failures += 1;
                    warn!(
                        "worker {}: falló Schedule ({}/{}): {}",
                        id, failures, self.config.max_schedule_failures, err
                    );
                    if failures >= self.config.max_schedule_failures {
                        return Err(WorkerError::CoordinatorGone {
                            failures,
                            last: err,
                        });
                    }

                    sleep(self.config.poll_interval).await;
                    continue;
                }
            };

            if self.id != Some(resp.worker_id) {
                info!("worker registrado con id = {}", resp.worker_id);
            }
            self.id = Some(resp.worker_id);
            summary.worker_id = self.id;

            if resp.is_finished {
                info!("worker {}: el master avisa que el job terminó", resp.worker_id);
                return Ok(summary);
            }

            if let Some(task) = resp.task {
                let kind = task.kind;
                match self.execute(resp.worker_id, task).await? {
                    TaskOutcome::Committed if kind == TaskKind::Map => summary.maps_committed += 1,
                    TaskOutcome::Committed => summary.reduces_committed += 1,
                    TaskOutcome::Discarded => summary.discarded += 1,
                    TaskOutcome::Deferred => summary.deferred += 1,
                }
            } else {
                debug!("worker {}: no hay tareas, reintentando", resp.worker_id);
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Ejecuta una tarea, la reporta y hace commit sólo si el master la acepta.
    pub async fn execute(
        &self,
        worker_id: WorkerId,
        task: TaskAssignment,
    ) -> Result<TaskOutcome, WorkerError> {
        let label = format!("{:?} {}", task.kind, task.index);
        info!(
            "worker {}: tengo tarea {} (entradas={:?})",
            worker_id, label, task.input_files
        );

        // el map que los produjo puede estar renombrando todavía
        if task.kind == TaskKind::Reduce && !self.wait_for_inputs(&task.input_files).await {
            warn!(
                "worker {}: {} sin intermedios tras {:?}, se devuelve sin reportar",
                worker_id, label, self.config.input_wait
            );
            return Ok(TaskOutcome::Deferred);
        }

        // map/reduce de usuario + disco: al pool de hilos bloqueantes
        let workload = self.workload;
        let dir = self.config.output_dir.clone();
        let staged_task = task.clone();
        let pending = tokio::task::spawn_blocking(move || match staged_task.kind {
            TaskKind::Map => stage_map(&workload, &dir, &staged_task),
            TaskKind::Reduce => stage_reduce(&workload, &dir, &staged_task),
        })
        .await?
        .map_err(|source| WorkerError::Storage {
            task: label.clone(),
            source,
        })?;

        let report = CollectRequest {
            kind: task.kind,
            worker_id,
            task_index: task.index,
            committed_files: pending.target_names(),
        };

        let accepted = match self.coordinator.collect(report).await {
            Ok(resp) => resp.accepted,
            Err(err) => {
                warn!("worker {}: falló Collect de {}: {}", worker_id, label, err);
                false
            }
        };

        if !accepted {
            info!("worker {}: {} rechazada, descartando {} archivos", worker_id, label, pending.len());
            pending.discard();
            return Ok(TaskOutcome::Discarded);
        }

        let committed = pending
            .commit()
            .map_err(|source| WorkerError::Storage {
                task: label.clone(),
                source,
            })?;
        info!("worker {}: {} publicada en {:?}", worker_id, label, committed);

        Ok(TaskOutcome::Committed)
    }
}

impl<C> Worker<C> {
    /// Espera (como mucho `input_wait`) a que existan todos los archivos.
    async fn wait_for_inputs(&self, files: &[String]) -> bool {
        let deadline = Instant::now() + self.config.input_wait;

        loop {
            let mut missing = None;
            for file in files {
                if !tokio::fs::try_exists(file).await.unwrap_or(false) {
                    missing = Some(file);
                    break;
                }
            }

            let Some(file) = missing else {
                return true;
            };
            if Instant::now() >= deadline {
                return false;
            }
            debug!("esperando intermedio {}", file);
            sleep(self.config.poll_interval).await;
        }
    }
}

/// Map: lee el split completo, aplica el map, particiona en R buckets ordenados
/// y escribe cada bucket a un temporal destinado a mr-{map}-{bucket}.
fn stage_map(workload: &Workload, dir: &Path, task: &TaskAssignment) -> io::Result<PendingCommit> {
    let input = task.input_files.first().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "tarea map sin archivo de entrada")
    })?;

    let buckets = engine::run_map(workload, input, task.reduce_count)?;

    let mut pending = PendingCommit::new();
    for (r, bucket) in buckets.iter().enumerate() {
        let target = store::intermediate_path(dir, task.index, r as u32);
        pending.push(store::stage_intermediate(dir, target, bucket)?);
    }
    Ok(pending)
}

/// Reduce: junta los intermedios de la partición, ordena, agrupa y reduce
/// a un temporal destinado a mr-out-{partición}.
fn stage_reduce(workload: &Workload, dir: &Path, task: &TaskAssignment) -> io::Result<PendingCommit> {
    let mut intermediate = Vec::new();
    for file in &task.input_files {
        intermediate.extend(store::read_intermediate(Path::new(file))?);
    }

    let lines = engine::run_reduce(workload, intermediate);

    let mut pending = PendingCommit::new();
    let target = store::output_path(dir, task.index);
    pending.push(store::stage_output(dir, target, &lines)?);
    Ok(pending)
}
