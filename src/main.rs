mod assistant;
mod cli;
mod command;
mod conversation;
mod dashboard;
mod dispatcher;
mod error;
#[cfg(feature = "xlsx")]
mod export;
mod fmt;
mod models;
mod session;
mod settings;
mod source;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Login { name, email }) => cli::login::login(name, email),
        Some(Commands::Logout) => cli::login::logout(),
        Some(Commands::Whoami) => cli::login::whoami(),
        Some(Commands::Config {
            mode,
            api_url,
            export_dir,
        }) => cli::config::run(mode, api_url, export_dir),
        Some(Commands::Report {
            period,
            export,
            output_dir,
        }) => cli::report::run(period, export, output_dir).await,
        #[cfg(feature = "xlsx")]
        Some(Commands::Export { period, output_dir }) => cli::export::run(period, output_dir).await,
        #[cfg(feature = "xlsx")]
        Some(Commands::View { file }) => cli::export::view(&file),
        Some(Commands::Chat) | None => cli::chat::run().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
