//! # CLI Behavior
//!
//! One possible client for the Pokédex state, not the state itself. Only this
//! module knows about terminal I/O, exit codes and output formats.
//!
//! ## Storage Contexts
//!
//! Each invocation opens one storage context over the data directory, runs a
//! single command and exits. Writes land on disk before the process ends, so the
//! next invocation (or a long-running client on the same directory) sees them.
//!
//! ## Output
//!
//! `--output text` (default) prints styled messages and tables. `--output json`
//! prints the command's `CmdResult` as JSON, for scripts. Logs go to stderr and
//! follow `RUST_LOG`; `-v` raises the default level to `debug`.
//!
//! ## Exit Codes
//!
//! A command that returns an error (bad argument value, rejected import,
//! unreadable file) prints `Error: ...` to stderr and exits with status 1.
//! Storage write failures are not errors: they are logged and the command
//! reports its in-memory result, with an error-level message saying the change
//! was not saved.

mod commands;
mod render;
pub mod setup;

pub use commands::run;
