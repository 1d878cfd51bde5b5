//! # Dex CLI Architecture
//!
//! The `dex` binary is a thin terminal client over the `dexapp` library. This file
//! only invokes `cli::run()` and turns an error into an exit code; everything the
//! user sees is produced under `src/cli/`.
//!
//! ## Workspace Structure
//!
//! - `crates/dexapp/` - Core library: persisted cells, favorites, preferences,
//!   query state, list transforms
//! - `crates/dex/` - This CLI, depends on `dexapp`
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/dex/src/cli/)                            │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Logging setup + dispatch (commands.rs)                   │
//! │  - Text / JSON rendering (render.rs)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/dexapp/src/api.rs)                       │
//! │  - Owns the stores of one storage context                   │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (crates/dexapp/src/commands/*)               │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Testing Approach
//!
//! - Library behavior is unit tested next to the code in `dexapp`.
//! - Argument definitions are checked in `setup.rs`, rendering in `render.rs`,
//!   both against canned values.
//! - `tests/cli_e2e.rs` runs the real binary against a temporary data directory
//!   (`DEX_DATA`).

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
