//! Natter - single-room terminal chat
//!
//! `natter server` hosts the room, `natter client` joins it.

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod chat;
mod cli;
mod config;
mod console;
mod presenter;

use cli::{Cli, ClientArgs, Command, ServerArgs};
use config::FileConfig;
use natter_net::Server;
use presenter::Terminal;

fn main() {
    let cli = Cli::parse();

    // Chat text owns stdout; log lines go to stderr
    let default_level = match cli.command {
        Command::Server(_) => "info",
        Command::Client(_) => "warn",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Server(args) => run_server(args).await,
            Command::Client(args) => run_client(args).await,
        }
    });

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(args: ServerArgs) -> anyhow::Result<()> {
    let file = FileConfig::discover(args.config.as_deref())?;
    let config = config::resolve_server(&args, &file)?;

    let server = Server::start(&config).await?;
    println!("Listening for connections on port {}", server.addr().port());
    println!("To shutdown the server, type {}", console::EXIT_COMMAND);

    let (exit_tx, exit_rx) = tokio::sync::oneshot::channel();
    console::spawn(move || {
        let _ = exit_tx.send(());
    })
    .context("Failed to start operator console")?;

    // Without an operator (stdin closed) the server runs until killed
    if exit_rx.await.is_err() {
        std::future::pending::<()>().await;
    }

    server.shutdown();
    println!("Server has been shut down");
    std::process::exit(0);
}

async fn run_client(args: ClientArgs) -> anyhow::Result<()> {
    let file = FileConfig::discover(args.config.as_deref())?;
    let settings = config::resolve_client(&args, &file)?;

    let input = BufReader::new(tokio::io::stdin()).lines();
    let mut terminal = Terminal::stdout();
    chat::run(&settings, input, &mut terminal).await?;

    // Blocking stdin reads would otherwise hold the runtime open
    std::process::exit(0);
}
