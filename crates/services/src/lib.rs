#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;

pub use training_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError};

pub use sessions::{
    SESSION_SIZE, SessionBuilder, SessionPlan, SessionProgress, SessionResultListItem,
    SessionService, SessionWorkflow, TrainingOverview,
};
