mod plan;
mod progress;
mod view;

// Public API of the session subsystem.
pub use plan::{SessionBuilder, available_count, categories};
pub use progress::SessionProgress;
pub use view::{ResultItem, ScoreBand, SessionResults};
