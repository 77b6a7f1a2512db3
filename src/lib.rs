pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod fingering;
pub mod format;
pub mod geometry;
pub mod models;
pub mod notes;
pub mod progress;
pub mod session;
pub mod take;
pub mod tui;

pub use error::{Error, Result};
