use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SCHEDULE_WAIT: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_MAX_SCHEDULE_FAILURES: u32 = 10;
pub const DEFAULT_INPUT_WAIT: Duration = Duration::from_secs(5);

/// Parámetros del planificador del master.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Tiempo tras el cual una tarea InProgress se puede reasignar
    pub task_timeout: Duration,
    /// Máximo que un Schedule espera dentro del handler si no hay tarea asignable
    pub schedule_wait: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_timeout: DEFAULT_TASK_TIMEOUT,
            schedule_wait: DEFAULT_SCHEDULE_WAIT,
        }
    }
}

/// Parámetros de un worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pausa entre dos Schedule consecutivos
    pub poll_interval: Duration,
    /// Directorio donde quedan mr-X-Y y mr-out-Y (y los temporales)
    pub output_dir: PathBuf,
    /// Fallos seguidos de Schedule tras los cuales se da el master por caído
    pub max_schedule_failures: u32,
    /// Cuánto espera un reduce a que aparezcan sus intermedios (el map que los
    /// produjo puede estar todavía renombrando sus temporales)
    pub input_wait: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_dir: PathBuf::from("."),
            max_schedule_failures: DEFAULT_MAX_SCHEDULE_FAILURES,
            input_wait: DEFAULT_INPUT_WAIT,
        }
    }
}
