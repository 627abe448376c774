//! Shared helpers: logging, dates and external commands.

pub mod command;
pub mod date;
pub mod log;
