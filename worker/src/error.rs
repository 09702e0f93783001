use thiserror::Error;

/// Falla de una llamada al master (red caída, status no-2xx, cuerpo inválido).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("error HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("el master respondió con status {0}")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Falló el primer Schedule: sin identidad no hay nada que rescatar
    #[error("no se pudo contactar al master")]
    CoordinatorUnreachable(#[source] TransportError),

    #[error("el master no responde tras {failures} intentos seguidos")]
    CoordinatorGone {
        failures: u32,
        #[source]
        last: TransportError,
    },

    /// Error de disco: el worker se detiene y el master reasignará la tarea por timeout
    #[error("error de archivos ejecutando {task}")]
    Storage {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("la ejecución de la tarea se interrumpió")]
    Join(#[from] tokio::task::JoinError),
}
