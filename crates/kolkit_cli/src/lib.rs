//! Library side of the `kolkit` binary: logging setup and command bodies.

pub mod commands;
pub mod logging;
