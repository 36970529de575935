#![forbid(unsafe_code)]

//! Domain model and rules for the quiz trainer.
//!
//! Everything in this crate is pure: question and session types, the import
//! validator, and the answer evaluator. Persistence and orchestration live in
//! the `storage` and `services` crates.

pub mod evaluate;
pub mod model;
pub mod time;
pub mod validate;

pub use evaluate::{is_correct, normalize_text};
pub use time::Clock;
pub use validate::{ValidationReport, validate_questions, validate_questions_json};
