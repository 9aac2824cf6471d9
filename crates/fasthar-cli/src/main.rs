use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use fasthar_cli::OutputFormat;
use fasthar_cli::commands;
use fasthar_cli::commands::capture::CaptureOptions;
use fasthar_cli::commands::chart::ChartOptions;
use fasthar_core::StatKey;
use fasthar_core::analysis::StatKind;
use fasthar_server::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT, DEFAULT_SCRIPT, ServerConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fasthar")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Capture, enrich and chart the network history of a site",
    long_about = "fastHAR records a HAR document of a page with a headless browser, re-fetches \
                  every request to attach live response data, keeps each capture as a snapshot, \
                  and turns the snapshot history into per-resource-type stats and charts."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Args)]
struct StoreArgs {
    /// Snapshot store (memory:// or file:///path)
    #[arg(long = "store", env = "FASTHAR_STORE_URL", default_value_t = fasthar_store::default_store_url())]
    store_url: String,
}

#[derive(Args)]
struct CaptureArgs {
    /// Capture binary (default: phantomjs on PATH)
    #[arg(long = "capture-bin", env = "FASTHAR_CAPTURE_BIN", value_name = "PATH")]
    capture_bin: Option<PathBuf>,

    /// Script the capture binary runs
    #[arg(long = "capture-script", env = "FASTHAR_CAPTURE_SCRIPT", default_value = DEFAULT_SCRIPT)]
    capture_script: PathBuf,

    /// Entries re-fetched at once during enrichment
    #[arg(long, env = "FASTHAR_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,
}

impl CaptureArgs {
    fn into_config(self, store: StoreArgs) -> ServerConfig {
        let mut config = ServerConfig::new(store.store_url);
        config.capture_binary = self.capture_bin;
        config.capture_script = self.capture_script;
        config.max_concurrency = self.max_concurrency;
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Capture a page once, enrich it and store the snapshot
    Capture {
        /// Page to capture
        #[arg(value_name = "URL")]
        url: String,

        /// Milliseconds the browser waits after load before recording
        #[arg(long, value_name = "MS")]
        delay: Option<u64>,

        /// Snapshot ref (default: current UTC timestamp)
        #[arg(long = "ref")]
        snapshot_ref: Option<String>,

        /// Push webhook body (JSON) carrying the commit sha and repository url
        #[arg(long)]
        payload: Option<String>,

        /// Also write the enriched HAR to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not store the snapshot
        #[arg(long)]
        no_store: bool,

        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Show the stored snapshots of a page
    History {
        #[arg(value_name = "URL")]
        url: String,

        /// Print the document of the snapshot tagged with this ref
        #[arg(long = "ref")]
        snapshot_ref: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Per-resource-type sizes, times and request counts of stored snapshots
    Stats {
        #[arg(value_name = "URL")]
        url: String,

        /// Only the snapshot tagged with this ref
        #[arg(long = "ref")]
        snapshot_ref: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Chart series of one statistic across stored snapshots
    Chart {
        /// Statistic to chart (sizes, times or totals)
        #[arg(value_name = "STAT")]
        stat: StatKind,

        #[arg(value_name = "URL")]
        url: String,

        /// Only the snapshot tagged with this ref
        #[arg(long = "ref")]
        snapshot_ref: Option<String>,

        /// Only this resource type (or total)
        #[arg(long)]
        resource: Option<StatKey>,

        /// Leave out this resource type (or total)
        #[arg(long)]
        exclude: Option<StatKey>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n    \
        bash, zsh, fish, powershell, elvish\n\n\
        INSTALLATION:\n    \
        Bash:  fasthar completion --shell bash >> ~/.bashrc\n    \
        Zsh:   fasthar completion --shell zsh > \"${fpath[1]}/_fasthar\"  (or append to ~/.zshrc)\n    \
        Fish:  fasthar completion --shell fish > ~/.config/fish/completions/fasthar.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(short, long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let format = cli.format;
    tracing::debug!("Output format: {}", format.as_str());

    // Execute the command
    match cli.command {
        Commands::Serve {
            port,
            store,
            capture,
        } => {
            let mut config = capture.into_config(store);
            config.port = port;
            commands::serve::execute(config)
        }
        Commands::Capture {
            url,
            delay,
            snapshot_ref,
            payload,
            output,
            no_store,
            store,
            capture,
        } => commands::capture::execute(
            &capture.into_config(store),
            CaptureOptions {
                url: &url,
                delay_ms: delay,
                snapshot_ref,
                payload: payload.as_deref(),
                output: output.as_deref(),
                store: !no_store,
            },
            format,
        ),
        Commands::History {
            url,
            snapshot_ref,
            store,
        } => commands::history::execute(&store.store_url, &url, snapshot_ref.as_deref(), format),
        Commands::Stats {
            url,
            snapshot_ref,
            store,
        } => commands::stats::execute(&store.store_url, &url, snapshot_ref.as_deref(), format),
        Commands::Chart {
            stat,
            url,
            snapshot_ref,
            resource,
            exclude,
            store,
        } => commands::chart::execute(
            &store.store_url,
            ChartOptions {
                kind: stat,
                url: &url,
                snapshot_ref: snapshot_ref.as_deref(),
                resource,
                exclude,
            },
            format,
        ),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "fasthar=debug,fasthar_cli=debug,fasthar_core=debug,fasthar_capture=debug,\
             fasthar_enrich=debug,fasthar_store=debug,fasthar_server=debug,tower_http=debug",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "fasthar=info,fasthar_cli=info,fasthar_capture=warn,fasthar_enrich=warn,\
                 fasthar_store=warn,fasthar_server=info",
            )
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
