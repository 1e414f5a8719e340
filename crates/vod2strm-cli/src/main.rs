use clap::{ArgAction, Parser, Subcommand};
use commands::{check, clear, config, daemon, export};
use vod_export_config::PathManager;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "vod2strm")]
#[command(about = "vod2strm - Mirror a Dispatcharr VOD catalog into .strm marker trees")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the catalog to .strm trees (one-time run)
    #[command(long_about = "Export movies and series from the configured Dispatcharr instance into per-account .strm directory trees. With no flags, both movies and series are exported for every configured account.")]
    Export {
        /// Export movies only
        #[arg(long, action = ArgAction::SetTrue)]
        movies: bool,

        /// Export series only
        #[arg(long, action = ArgAction::SetTrue)]
        series: bool,

        /// Bypass cached listings and fetch fresh data from the API
        #[arg(long, action = ArgAction::SetTrue)]
        refresh: bool,

        /// Remove markers for items no longer in the listing (overrides config)
        #[arg(long, action = ArgAction::SetTrue)]
        delete_old: bool,

        /// Comma-separated account names or LIKE patterns ('%' matches any run)
        #[arg(long, value_name = "PATTERNS")]
        accounts: Option<String>,
    },
    /// Check an exported tree for problems (read-only)
    #[command(long_about = "Walk the exported movie and series roots and report empty or malformed marker files, markers without metadata sidecars, and directories holding no markers. Nothing is modified.")]
    Check {
        /// Comma-separated account names or LIKE patterns ('%' matches any run)
        #[arg(long, value_name = "PATTERNS")]
        accounts: Option<String>,
    },
    /// Run periodic exports in the foreground
    #[command(long_about = "Run vod2strm as a long-lived process that re-exports on a fixed interval. An export runs immediately on startup unless --no-startup-run is given. Logs go to the daemon log file.")]
    Daemon {
        /// Minutes between export runs (overrides config)
        #[arg(long, value_name = "MINUTES")]
        interval: Option<u64>,

        /// Skip the export on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_run: bool,
    },
    /// Configure API connection, credentials, and enrichment
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear cached listings or stored credentials
    Clear {
        /// Clear caches and credentials
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "credentials")]
        all: bool,

        /// Clear cached listings and enrichment responses
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show masked values in full
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Dispatcharr API connection
    Api {
        /// Base URL, e.g. http://127.0.0.1:9191
        #[arg(long)]
        base_url: Option<String>,

        /// API username (password is prompted and stored separately)
        #[arg(long)]
        username: Option<String>,
    },

    /// Configure TMDB enrichment
    Tmdb {
        /// Enable or disable enrichment
        #[arg(long)]
        enabled: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The daemon writes to a rotating log file; everything else logs to stderr.
    let log_file = match &cli.command {
        Commands::Daemon { .. } => Some(PathManager::default().daemon_log_file()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Export {
            movies,
            series,
            refresh,
            delete_old,
            accounts,
        } => {
            export::run_export(
                export::ExportArgs {
                    movies,
                    series,
                    refresh,
                    delete_old,
                    accounts,
                },
                &output,
            )
            .await
        }
        Commands::Check { accounts } => check::run_check(accounts, &output).await,
        Commands::Daemon {
            interval,
            no_startup_run,
        } => daemon::run_daemon(interval, no_startup_run, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
        Commands::Clear {
            all,
            cache,
            credentials,
        } => clear::run_clear(all, cache, credentials, &output).await,
    }
}
