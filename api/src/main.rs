mod assets;
mod config;
mod directory;
mod domains;
mod error;
mod handler;
mod http;
mod repositories;
mod server;

use std::{path::PathBuf, process, sync::Arc};

use clap::{Parser, Subcommand};
use directory::Directory;
use repositories::sql::SqlPeopleRepository;
use server::Server;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "phonebook", about = "Contact directory service", long_about = None)]
struct Args {
    /// TOML configuration file, overridden by environment variables
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Print every person in the phonebook
    List,
    /// Add a person to the phonebook
    Add { name: String, number: String },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let config = match config::Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            process::exit(1);
        }
    };

    let repository =
        match SqlPeopleRepository::connect(&config.database_url, config.max_connections).await {
            Ok(repository) => repository,
            Err(err) => {
                tracing::error!(error = ?err, "failed to connect to the database");
                process::exit(1);
            }
        };
    let directory = Directory::new(Arc::new(repository));

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, directory).await,
        Command::List => list(&directory).await,
        Command::Add { name, number } => add(&directory, name, number).await,
    };

    if let Err(err) = result {
        tracing::error!(error = ?err, "command failed");
        process::exit(1);
    }
}

async fn serve(config: config::Config, directory: Directory) -> anyhow::Result<()> {
    let state = AppState {
        directory,
        static_dir: PathBuf::from(&config.static_dir),
    };

    let server = Server::new(state, handler::route_request, config.request_timeout());
    server.bind(config.server_address).await?;

    Ok(())
}

async fn list(directory: &Directory) -> anyhow::Result<()> {
    println!("Phonebook:");
    for person in directory.list().await? {
        println!("{} {}", person.name, person.number);
    }

    Ok(())
}

async fn add(directory: &Directory, name: String, number: String) -> anyhow::Result<()> {
    let person = directory.create(Some(name), Some(number)).await?;
    println!("added {} number {} to phonebook", person.name, person.number);

    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub directory: Directory,
    pub static_dir: PathBuf,
}
