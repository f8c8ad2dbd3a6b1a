//! Shared library modules providing error types, host command execution, and telemetry initialization.

pub mod errors;
pub mod shell;
pub mod telemetry;
