use serde::{Deserialize, Serialize};

/// Tipo de tarea: una por archivo de entrada (Map) o una por partición (Reduce).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Trabajo concreto que el master entrega a un worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub kind: TaskKind,
    /// Índice del split (Map) o de la partición (Reduce)
    pub index: u32,
    /// Map: el archivo de entrada. Reduce: un archivo intermedio por cada map.
    pub input_files: Vec<String>,
    /// Número de particiones R (lo necesita el map para particionar)
    pub reduce_count: u32,
}
