//! # Initialization
//!
//! Wires a [`DexApi`] over the filesystem for a real session.
//!
//! ## Data Directory
//!
//! Resolved in priority order:
//! 1. `data_override` (the CLI's `--data`)
//! 2. `DEX_DATA` environment variable (used by tests to isolate state)
//! 3. The OS data directory for `dex` (via the `directories` crate)
//!
//! The directory holds `dex.toml` and one `.slot` file per storage slot. It is
//! created on the first write, not here.

use std::path::PathBuf;
use std::rc::Rc;

use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use tracing::debug;

use crate::api::DexApi;
use crate::config::DexConfig;
use crate::error::{DexError, Result};
use crate::store::FsBackend;

pub const DATA_ENV: &str = "DEX_DATA";
pub const CONFIG_FILE: &str = "dex.toml";

pub struct DexContext {
    pub api: DexApi<FsBackend>,
    pub config: DexConfig,
    pub data_dir: PathBuf,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_ENV) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "dex", "dex")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| DexError::Store("could not determine a data directory".to_string()))
}

pub fn load_config(data_dir: &std::path::Path) -> DexConfig {
    Clapfig::builder()
        .app_name("dex")
        .file_name(CONFIG_FILE)
        .search_paths(vec![SearchPath::Path(data_dir.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

pub fn initialize(data_override: Option<PathBuf>) -> Result<DexContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = load_config(&data_dir);
    debug!(data_dir = %data_dir.display(), prefix = %config.key_prefix, "initializing dex");

    let backend = FsBackend::new(data_dir.clone()).with_quota(config.storage_quota);
    let api = DexApi::new(Rc::new(backend), config.clone());

    Ok(DexContext {
        api,
        config,
        data_dir,
    })
}
