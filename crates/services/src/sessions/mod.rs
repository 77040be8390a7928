mod plan;
mod progress;
mod queries;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SESSION_SIZE, SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use service::SessionService;
pub use view::{SessionResultListItem, TrainingOverview};
pub use workflow::SessionWorkflow;
