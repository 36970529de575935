#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod store;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, ImportError, StoreError};
pub use sessions::{
    ResultItem, ScoreBand, SessionBuilder, SessionProgress, SessionResults, available_count,
    categories,
};
pub use store::{ImportSummary, NewSessionConfig, QuizStore};
