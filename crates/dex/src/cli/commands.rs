//! # CLI Layer
//!
//! The only place in the workspace that:
//! - parses shell arguments
//! - installs the log subscriber
//! - reads import files and writes export files
//! - prints
//!
//! Each subcommand maps to one `DexApi` call; the returned `CmdResult` goes to
//! [`render`](super::render).

use std::fs;
use std::io::Read;
use std::path::Path;

use clap::Parser;
use dexapp::api::{DexApi, FavoriteFilter};
use dexapp::commands::{CmdMessage, CmdResult};
use dexapp::error::Result;
use dexapp::init::initialize;
use dexapp::store::StorageBackend;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::render::print_result;
use super::setup::{Cli, Commands, FavCommands, PrefsCommands, QueryCommands};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut ctx = initialize(cli.data)?;
    debug!(data_dir = %ctx.data_dir.display(), "context ready");

    let result = dispatch(&mut ctx.api, cli.command)?;
    print_result(&result, cli.output)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (only possible in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn dispatch<B: StorageBackend>(api: &mut DexApi<B>, command: Commands) -> Result<CmdResult> {
    match command {
        Commands::Fav(cmd) => dispatch_fav(api, cmd),
        Commands::Prefs(cmd) => dispatch_prefs(api, cmd),
        Commands::Query(cmd) => dispatch_query(api, cmd),
    }
}

fn dispatch_fav<B: StorageBackend>(api: &mut DexApi<B>, cmd: FavCommands) -> Result<CmdResult> {
    match cmd {
        FavCommands::Add { id, name, url } => api.add_favorite(id, &name, url.as_deref()),
        FavCommands::Remove { ids } => api.remove_favorites(&ids),
        FavCommands::Toggle { id, name, url } => api.toggle_favorite(id, &name, url.as_deref()),
        FavCommands::List {
            sort,
            search,
            generation,
        } => {
            let filter = FavoriteFilter { search, generation };
            api.list_favorites(sort, &filter)
        }
        FavCommands::Clear => api.clear_favorites(),
    }
}

fn dispatch_prefs<B: StorageBackend>(
    api: &mut DexApi<B>,
    cmd: PrefsCommands,
) -> Result<CmdResult> {
    match cmd {
        PrefsCommands::Show { view } => api.show_preferences(view.as_deref()),
        PrefsCommands::Set {
            field,
            value,
            view,
            global,
        } => api.set_preference(view.as_deref(), field, &value, global),
        PrefsCommands::Reset { field, view } => api.reset_preference(view.as_deref(), field),
        PrefsCommands::ResetView { view } => api.reset_view_preferences(&view),
        PrefsCommands::ResetAll => api.reset_all_preferences(),
        PrefsCommands::Export { file } => {
            let mut result = api.export_preferences()?;
            if let Some(path) = file {
                let doc = result.export.take().unwrap_or_default();
                fs::write(&path, doc)?;
                result.add_message(CmdMessage::success(format!(
                    "Exported preferences to {}",
                    path.display()
                )));
            }
            Ok(result)
        }
        PrefsCommands::Import { file } => {
            let raw = read_input(&file)?;
            api.import_preferences(&raw)
        }
        PrefsCommands::Usage => api.storage_usage(),
        PrefsCommands::ViewMode { list, mode } => api.view_mode(&list, mode),
    }
}

fn dispatch_query<B: StorageBackend>(api: &DexApi<B>, cmd: QueryCommands) -> Result<CmdResult> {
    match cmd {
        QueryCommands::Decode { query } => api.decode_query(&query),
        QueryCommands::Set { from, assignments } => api.set_query(&from, &assignments),
        QueryCommands::Reset { query } => api.reset_query(&query),
    }
}

/// `-` reads stdin.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
