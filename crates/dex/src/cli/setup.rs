use clap::{Parser, Subcommand, ValueEnum};
use dexapp::favorites::FavoriteSort;
use dexapp::model::{PreferenceField, ViewMode};
use dexapp::query::GenerationFilter;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "dex", bin_name = "dex", version, disable_help_subcommand = true)]
#[command(
    about = "Favorites, display preferences and shareable list filters for the Pokédex browser",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: $DEX_DATA, then the OS data directory)
    #[arg(long, global = true, help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Text, help_heading = "Options")]
    pub output: OutputMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage favorites
    #[command(subcommand, alias = "favorites")]
    Fav(FavCommands),

    /// Show and change display preferences
    #[command(subcommand, alias = "preferences")]
    Prefs(PrefsCommands),

    /// Decode and edit list-view query strings
    #[command(subcommand)]
    Query(QueryCommands),
}

#[derive(Subcommand, Debug)]
pub enum FavCommands {
    /// Add a Pokémon to favorites
    Add {
        /// National dex number
        id: u32,
        name: String,
        /// Resource URL (default: the PokéAPI URL for the id)
        #[arg(long)]
        url: Option<String>,
    },

    /// Remove favorites by dex number
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true)]
        ids: Vec<u32>,
    },

    /// Add if missing, remove if present
    Toggle {
        id: u32,
        name: String,
        #[arg(long)]
        url: Option<String>,
    },

    /// List favorites
    #[command(alias = "ls")]
    List {
        /// Order: recent, name or id
        #[arg(long, default_value = "recent")]
        sort: FavoriteSort,

        /// Only names containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only this generation (gen1..gen9, or all)
        #[arg(short, long, default_value = "all")]
        generation: GenerationFilter,
    },

    /// Remove every favorite
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Show global or per-view preferences
    Show {
        /// View key (e.g. home, types, abilities)
        #[arg(long)]
        view: Option<String>,
    },

    /// Set a preference (e.g. `dex prefs set viewMode list --view home`)
    Set {
        field: PreferenceField,
        value: String,

        /// Override only this view
        #[arg(long)]
        view: Option<String>,

        /// With --view: write globally and drop the view's override
        #[arg(long, requires = "view")]
        global: bool,
    },

    /// Reset one preference (a view override, or the global value)
    Reset {
        field: PreferenceField,

        #[arg(long)]
        view: Option<String>,
    },

    /// Remove all overrides of a view
    ResetView { view: String },

    /// Reset global preferences and every view override
    ResetAll,

    /// Export preferences as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Import preferences from an export file (`-` for stdin)
    Import { file: PathBuf },

    /// Show how much storage preferences use
    Usage,

    /// Show or set the stored view mode of a list
    ViewMode { list: String, mode: Option<ViewMode> },
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Show the state a query string decodes to
    Decode {
        #[arg(default_value = "")]
        query: String,
    },

    /// Apply param=value assignments (e.g. `sort=name-asc page=2`)
    Set {
        /// Query string to start from
        #[arg(long, default_value = "")]
        from: String,

        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Drop every managed param from a query string
    Reset { query: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_typed_arguments() {
        let cli = Cli::try_parse_from(["dex", "fav", "list", "--sort", "name", "-g", "gen2"]).unwrap();
        match cli.command {
            Commands::Fav(FavCommands::List { sort, generation, .. }) => {
                assert_eq!(sort, FavoriteSort::Name);
                assert_ne!(generation, GenerationFilter::All);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_requires_view() {
        assert!(Cli::try_parse_from(["dex", "prefs", "set", "theme", "dark", "--global"]).is_err());
        assert!(Cli::try_parse_from(["dex", "prefs", "set", "bogus", "1"]).is_err());
    }
}
