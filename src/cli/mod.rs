pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

#[derive(Parser)]
#[command(name = "payroll")]
#[command(about = "Payroll CLI - Administration for the Payroll API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create or update the database schema")]
    Migrate,

    #[command(about = "Print the stored digest for a password")]
    HashPassword {
        #[arg(help = "Plaintext password")]
        password: String,
    },

    #[command(about = "Create an account directly in the database")]
    CreateUser {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password")]
        password: String,
        #[arg(long, default_value = "user", help = "Role: admin, editor or user")]
        role: Role,
    },

    #[command(about = "Check a running server's /health endpoint")]
    Ping {
        #[arg(long, env = "PAYROLL_URL", default_value = "http://localhost:3000")]
        url: String,
    },

    #[command(about = "Log in to a running server and print the token")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password")]
        password: String,
        #[arg(long, env = "PAYROLL_URL", default_value = "http://localhost:3000")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::database::migrate(output_format).await,
        Commands::HashPassword { password } => commands::user::hash_password(&password, output_format),
        Commands::CreateUser { username, password, role } => {
            commands::user::create_user(&username, &password, role, output_format).await
        }
        Commands::Ping { url } => commands::server::ping(&url, output_format).await,
        Commands::Login { username, password, url } => {
            commands::server::login(&url, &username, &password, output_format).await
        }
    }
}
