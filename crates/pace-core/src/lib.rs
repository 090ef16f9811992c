pub mod allocation;
pub mod calendar;
pub mod classifier;
pub mod config;
pub mod cycle;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod issue;
pub mod notify;
pub mod paths;
pub mod report;
pub mod snapshot;
pub mod velocity;

pub use error::{PaceError, Result};
