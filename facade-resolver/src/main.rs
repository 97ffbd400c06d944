//! facade-resolver - label geolocation worker
//!
//! ## Commands
//!
//! - `serve`: read image ids from stdin, one per line, and resolve each in
//!   the background
//! - `process <image_id>...`: resolve the given images and exit
//! - `locate <label_id>`: print the ground point of one label as JSON

use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use facade_resolver::{App, FacadeConfig, Result};

/// Pin panorama labels to building facades and street addresses
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "facade.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read image ids from stdin and resolve them in the background
    Serve,
    /// Resolve the labels of the given images
    Process {
        #[arg(required = true)]
        image_ids: Vec<String>,
    },
    /// Print the ground point of a single label
    Locate { label_id: String },
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e}");
        eprintln!("facade-resolver: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Logging comes from config, so read it before the logger exists
    let config = FacadeConfig::load_or_default(&args.config)?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("facade-resolver v{}", env!("CARGO_PKG_VERSION"));
    let app = App::bootstrap(config)?;

    match args.command {
        Command::Locate { label_id } => {
            let located = app.locator.locate(&label_id)?;
            println!("{}", located.to_json());
        }
        Command::Process { image_ids } => {
            app.warm()?;
            let dispatcher = app.dispatcher()?;
            for image_id in &image_ids {
                dispatcher.process(image_id);
            }
            dispatcher.shutdown();
        }
        Command::Serve => {
            app.warm()?;
            let dispatcher = app.dispatcher()?;
            log::info!("Reading image ids from stdin");
            for line in std::io::stdin().lock().lines() {
                dispatcher.process(&line?);
            }
            log::info!("Input closed, draining queue");
            dispatcher.shutdown();
        }
    }
    Ok(())
}
