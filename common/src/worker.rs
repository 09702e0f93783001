use serde::{Deserialize, Serialize};

use crate::job::JobPhase;
use crate::task::{TaskAssignment, TaskKind};

pub type WorkerId = u64;

/// Petición de trabajo. `worker_id = None` la usa un worker recién arrancado.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub worker_id: Option<WorkerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    /// Identidad que el worker debe usar desde ahora en todas sus llamadas
    pub worker_id: WorkerId,
    pub phase: JobPhase,
    /// Si es true el worker debe dejar de pedir trabajo
    pub is_finished: bool,
    /// None sin `is_finished`: no hay nada asignable todavía, reintentar
    pub task: Option<TaskAssignment>,
}

/// Reporte de fin de tarea con los nombres finales que el worker quiere publicar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectRequest {
    pub kind: TaskKind,
    pub worker_id: WorkerId,
    pub task_index: u32,
    #[serde(default)]
    pub committed_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectResponse {
    pub accepted: bool,
}
