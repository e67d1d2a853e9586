//! Command-line front end.

pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod logging;
