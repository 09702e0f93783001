// master/src/state.rs

use chrono::{DateTime, Utc};
use common::{CollectRequest, JobPhase, TaskAssignment, TaskKind, WorkerId};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }
}

/// Una identidad que el master no emitió sólo se acepta hasta este valor;
/// así el contador nunca desborda.
pub const MAX_WORKER_ID: WorkerId = WorkerId::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    InProgress,
    Completed,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub kind: TaskKind,
    pub index: u32,
    pub state: TaskState,
    /// Último worker al que se le asignó (sirve para rechazar reportes viejos)
    pub owner: Option<WorkerId>,
    pub assigned_at: Option<Instant>,
    pub input_files: Vec<String>,
    /// Nombres finales aceptados en el Collect
    pub output_files: Vec<String>,
    pub attempts: u32,
}

impl Task {
    fn new(kind: TaskKind, index: u32, input_files: Vec<String>) -> Self {
        Self {
            kind,
            index,
            state: TaskState::Idle,
            owner: None,
            assigned_at: None,
            input_files,
            output_files: Vec::new(),
            attempts: 0,
        }
    }

    fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        match (self.state, self.assigned_at) {
            (TaskState::InProgress, Some(at)) => now.saturating_duration_since(at) >= timeout,
            _ => false,
        }
    }
}

/// Resultado de intentar asignar trabajo a un worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Task(TaskAssignment),
    Finished,
    /// Nada asignable; `next_stale` es cuándo vence la próxima tarea en vuelo
    Wait { next_stale: Option<Instant> },
}

/// Tabla de tareas del job. Vive sólo mientras vive el master.
#[derive(Debug)]
pub struct Job {
    pub phase: JobPhase,
    pub map_tasks: Vec<Task>,
    pub reduce_tasks: Vec<Task>,
    pub reduce_count: u32,
    next_worker_id: WorkerId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Una tarea map por archivo de entrada y `reduce_count` tareas reduce.
    pub fn new(input_files: Vec<String>, reduce_count: u32) -> Self {
        let map_tasks = input_files
            .into_iter()
            .enumerate()
            .map(|(i, file)| Task::new(TaskKind::Map, i as u32, vec![file]))
            .collect();
        let reduce_tasks = (0..reduce_count)
            .map(|r| Task::new(TaskKind::Reduce, r, Vec::new()))
            .collect();

        let mut job = Self {
            phase: JobPhase::Mapping,
            map_tasks,
            reduce_tasks,
            reduce_count,
            next_worker_id: 1,
            started_at: Utc::now(),
            finished_at: None,
        };
        // sin archivos o sin reducers alguna fase ya está completa
        job.advance_phase();
        job
    }

    /// Devuelve la identidad a usar: la que trae el worker o una nueva.
    pub fn identify(&mut self, presented: Option<WorkerId>) -> WorkerId {
        match presented {
            Some(id) if id <= MAX_WORKER_ID || id < self.next_worker_id => {
                // nunca volver a emitir una identidad que ya anda circulando
                if id >= self.next_worker_id {
                    self.next_worker_id = id + 1;
                }
                id
            }
            Some(id) => {
                warn!("identidad {} fuera de rango, se emite una nueva", id);
                self.mint()
            }
            None => self.mint(),
        }
    }

    fn mint(&mut self) -> WorkerId {
        let id = self.next_worker_id;
        self.next_worker_id = self.next_worker_id.saturating_add(1);
        info!("nueva identidad de worker: {}", id);
        id
    }

    fn current_tasks_mut(&mut self) -> Option<&mut Vec<Task>> {
        match self.phase {
            JobPhase::Mapping => Some(&mut self.map_tasks),
            JobPhase::Reducing => Some(&mut self.reduce_tasks),
            JobPhase::Done => None,
        }
    }

    pub fn tasks(&self, kind: TaskKind) -> &[Task] {
        match kind {
            TaskKind::Map => &self.map_tasks,
            TaskKind::Reduce => &self.reduce_tasks,
        }
    }

    fn tasks_mut(&mut self, kind: TaskKind) -> &mut Vec<Task> {
        match kind {
            TaskKind::Map => &mut self.map_tasks,
            TaskKind::Reduce => &mut self.reduce_tasks,
        }
    }

    /// Busca una tarea Idle (o InProgress vencida) de la fase actual,
    /// la de menor índice, y se la entrega a `worker`.
    pub fn assign(&mut self, worker: WorkerId, now: Instant, timeout: Duration) -> Assignment {
        let reduce_count = self.reduce_count;
        let Some(tasks) = self.current_tasks_mut() else {
            return Assignment::Finished;
        };

        // un worker secuencial que pide trabajo ya abandonó lo que tuviera
        for task in tasks.iter_mut() {
            if task.state == TaskState::InProgress && task.owner == Some(worker) {
                warn!(
                    "worker {} pidió trabajo teniendo {:?} {} en vuelo; se libera",
                    worker, task.kind, task.index
                );
                task.state = TaskState::Idle;
                task.assigned_at = None;
            }
        }

        let candidate = tasks
            .iter_mut()
            .find(|t| t.state == TaskState::Idle || t.is_stale(now, timeout));

        if let Some(task) = candidate {
            if task.state == TaskState::InProgress {
                warn!(
                    "tarea {:?} {} vencida (worker {:?} sin reportar), reasignando a worker {}",
                    task.kind, task.index, task.owner, worker
                );
            }

            task.state = TaskState::InProgress;
            task.owner = Some(worker);
            task.assigned_at = Some(now);
            task.attempts += 1;

            info!(
                "asignando tarea {:?} {} (intento {}) al worker {}",
                task.kind, task.index, task.attempts, worker
            );

            return Assignment::Task(TaskAssignment {
                kind: task.kind,
                index: task.index,
                input_files: task.input_files.clone(),
                reduce_count,
            });
        }

        let next_stale = tasks
            .iter()
            .filter(|t| t.state == TaskState::InProgress)
            .filter_map(|t| t.assigned_at)
            .map(|at| at + timeout)
            .min();

        Assignment::Wait { next_stale }
    }

    /// Acepta el reporte sólo si la tarea sigue InProgress a nombre de ese worker.
    /// Cualquier otra cosa (tarea reasignada, ya completada, índice raro) se rechaza.
    pub fn collect(&mut self, req: &CollectRequest) -> bool {
        let reduce_count = self.reduce_count as usize;
        let tasks = self.tasks_mut(req.kind);

        let Some(task) = tasks.get_mut(req.task_index as usize) else {
            warn!(
                "rechazado: worker {} reportó {:?} {} que no existe",
                req.worker_id, req.kind, req.task_index
            );
            return false;
        };

        if task.state != TaskState::InProgress || task.owner != Some(req.worker_id) {
            info!(
                "rechazado: {:?} {} de worker {} (estado={:?}, dueño={:?})",
                req.kind, req.task_index, req.worker_id, task.state, task.owner
            );
            return false;
        }

        if req.kind == TaskKind::Map && req.committed_files.len() != reduce_count {
            warn!(
                "rechazado: map {} de worker {} trae {} archivos, se esperaban {}",
                req.task_index,
                req.worker_id,
                req.committed_files.len(),
                reduce_count
            );
            return false;
        }

        task.state = TaskState::Completed;
        task.output_files = req.committed_files.clone();
        info!(
            "aceptado: {:?} {} de worker {} -> {:?}",
            req.kind, req.task_index, req.worker_id, task.output_files
        );

        self.advance_phase();
        true
    }

    fn all_completed(tasks: &[Task]) -> bool {
        tasks.iter().all(|t| t.state == TaskState::Completed)
    }

    /// Mapping -> Reducing -> Done, nunca hacia atrás.
    fn advance_phase(&mut self) {
        loop {
            match self.phase {
                JobPhase::Mapping if Self::all_completed(&self.map_tasks) => {
                    for (r, reduce) in self.reduce_tasks.iter_mut().enumerate() {
                        reduce.input_files = self
                            .map_tasks
                            .iter()
                            .filter_map(|m| m.output_files.get(r).cloned())
                            .collect();
                    }
                    self.phase = JobPhase::Reducing;
                    info!(
                        "fase map terminada ({} tareas), pasando a reduce ({} tareas)",
                        self.map_tasks.len(),
                        self.reduce_tasks.len()
                    );
                }
                JobPhase::Reducing if Self::all_completed(&self.reduce_tasks) => {
                    let finished = Utc::now();
                    self.phase = JobPhase::Done;
                    self.finished_at = Some(finished);
                    info!(
                        "job terminado en {} ms",
                        (finished - self.started_at).num_milliseconds()
                    );
                }
                _ => break,
            }
        }
    }
}
