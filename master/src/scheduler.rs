use common::{
    CollectRequest, CollectResponse, JobPhase, ScheduleRequest, ScheduleResponse,
    SchedulerConfig, TaskKind,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::state::{Assignment, Job, TaskState};

/// Planificador del master: toda lectura o escritura de la tabla de tareas
/// pasa por el mismo mutex.
pub struct Scheduler {
    job: Mutex<Job>,
    /// Se avisa en cada Collect aceptado (puede haber cambiado la fase)
    changed: Notify,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(input_files: Vec<String>, reduce_count: u32, config: SchedulerConfig) -> Self {
        Self {
            job: Mutex::new(Job::new(input_files, reduce_count)),
            changed: Notify::new(),
            config,
        }
    }

    fn job(&self) -> MutexGuard<'_, Job> {
        // un panic en otro handler no debe dejar al master sin responder
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn phase(&self) -> JobPhase {
        self.job().phase
    }

    pub fn is_done(&self) -> bool {
        self.phase().is_done()
    }

    pub fn task_state(&self, kind: TaskKind, index: u32) -> Option<TaskState> {
        self.job().tasks(kind).get(index as usize).map(|t| t.state)
    }

    /// Schedule: identifica al worker y le entrega una tarea. Si no hay nada
    /// asignable espera (sin girar) a que un Collect cambie el estado o a que
    /// venza alguna tarea en vuelo, como mucho `schedule_wait`.
    pub async fn schedule(&self, req: ScheduleRequest) -> ScheduleResponse {
        let worker_id = self.job().identify(req.worker_id);
        let give_up_at = Instant::now() + self.config.schedule_wait;

        loop {
            // registrarse antes de mirar la tabla para no perder avisos
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let now = Instant::now();
            let (phase, outcome) = {
                let mut job = self.job();
                let outcome = job.assign(worker_id, now, self.config.task_timeout);
                (job.phase, outcome)
            };

            match outcome {
                Assignment::Task(task) => {
                    return ScheduleResponse {
                        worker_id,
                        phase,
                        is_finished: false,
                        task: Some(task),
                    };
                }
                Assignment::Finished => {
                    return ScheduleResponse {
                        worker_id,
                        phase,
                        is_finished: true,
                        task: None,
                    };
                }
                Assignment::Wait { next_stale } => {
                    if now >= give_up_at {
                        debug!("worker {} sin tarea asignable, que reintente", worker_id);
                        return ScheduleResponse {
                            worker_id,
                            phase,
                            is_finished: false,
                            task: None,
                        };
                    }

                    let wake_at = next_stale.map_or(give_up_at, |at| at.min(give_up_at));
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = sleep_until(wake_at) => {}
                    }
                }
            }
        }
    }

    /// Collect: acepta o rechaza el reporte. Nunca falla.
    pub fn collect(&self, req: CollectRequest) -> CollectResponse {
        let accepted = self.job().collect(&req);
        if accepted {
            self.changed.notify_waiters();
        }
        CollectResponse { accepted }
    }

    /// Termina cuando el job llega a Done.
    pub async fn wait_done(&self) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_done() {
                return;
            }
            notified.await;
        }
    }
}
