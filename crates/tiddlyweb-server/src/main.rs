//! TiddlyWeb server entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::{error, info};

use tiddlyweb_config::ConfigLoader;
use tiddlyweb_core::{fixtures, MemoryStore, Store};
use tiddlyweb_server::Server;

/// Command-line arguments.
struct Args {
    config: Option<PathBuf>,
    sample: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            config: None,
            sample: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--sample" => parsed.sample = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-V" => {
                    println!("tiddlyweb {}", tiddlyweb_server::VERSION);
                    std::process::exit(0);
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(parsed)
    }
}

fn print_help() {
    println!(
        r"TiddlyWeb - a RESTful wiki server

USAGE:
    tiddlyweb [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON)
        --sample           Start with sample bags, recipes and users
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    TIDDLYWEB__SERVER__HTTP_ADDR     Listen address (default: 0.0.0.0:8080)
    TIDDLYWEB__SERVER_HOST__HOST     Public host name used in URLs
    TIDDLYWEB__SERVER_PREFIX         Path prefix of every URL
    TIDDLYWEB__SECRET                Key for signing identity cookies
    TIDDLYWEB__LOGGING__LEVEL        Log filter directive (default: info)
"
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Use --help for usage information");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "Server failed");
            eprintln!("tiddlyweb: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = &args.config {
        loader = loader
            .with_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    let config = loader.with_env_prefix("TIDDLYWEB").load()?;

    tiddlyweb_telemetry::init_logging(&config.logging.to_log_config())?;
    info!(
        version = tiddlyweb_server::VERSION,
        addr = %config.server.http_addr,
        "Starting TiddlyWeb"
    );

    let store = MemoryStore::new();
    if args.sample {
        fixtures::populate(&store)?;
        info!(store = store.name(), "Loaded sample content");
    }

    Server::new(config, Arc::new(store))?.run().await?;
    Ok(())
}
