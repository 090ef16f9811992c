pub mod calendar;
pub mod config;
pub mod history;
pub mod report;
