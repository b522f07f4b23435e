use clap::{Parser, Subcommand};
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cli;

use cli::sessions::SessionsCommands;

#[derive(Parser)]
#[command(name = "seva")]
#[command(about = "Seva CLI - companion chat for elder care")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Email address
        #[arg(short, long)]
        email: Option<String>,
        /// Full name
        #[arg(short, long)]
        full_name: Option<String>,
    },
    /// Sign in and store session tokens
    Login {
        /// Email address
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Send a message, or start an interactive conversation
    Chat {
        /// Message to send; omit to chat interactively
        message: Option<String>,
        /// Continue an existing session
        #[arg(short, long)]
        session: Option<Uuid>,
    },
    /// Manage conversation sessions
    #[command(subcommand)]
    Sessions(SessionsCommands),
    /// Check backend availability
    Health,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match handle_command(cli.command).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Register { email, full_name } => {
            cli::auth::handle_register_command(email, full_name).await
        }
        Commands::Login { email } => cli::auth::handle_login_command(email).await,
        Commands::Logout => cli::auth::handle_logout_command().await,
        Commands::Whoami => cli::auth::handle_whoami_command().await,
        Commands::Chat { message, session } => {
            cli::chat::handle_chat_command(message, session).await
        }
        Commands::Sessions(sessions_cmd) => {
            cli::sessions::handle_sessions_command(sessions_cmd).await
        }
        Commands::Health => cli::health::handle_health_command().await,
    }
}
