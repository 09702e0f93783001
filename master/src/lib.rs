pub mod handlers;
pub mod scheduler;
pub mod state;

pub use handlers::build_router;
pub use scheduler::Scheduler;
pub use state::AppState;
