pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::database::models::UserRole;

#[derive(Parser)]
#[command(name = "boarding")]
#[command(about = "Boarding API operator tool - migrations, fixtures, tokens and health checks")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Load landlords, properties, rooms and boarders from a YAML fixture")]
    Seed {
        #[arg(help = "Fixture file")]
        file: PathBuf,
        #[arg(long, help = "Tenant to load into (overrides the fixture's tenant_id)")]
        tenant: Option<Uuid>,
    },

    #[command(about = "Print a signed session token")]
    Token {
        #[arg(long, help = "User id (sub claim)")]
        user: Uuid,
        #[arg(long, help = "Tenant id")]
        tenant: Uuid,
        #[arg(long, help = "boarder, landlord or admin")]
        role: UserRole,
        #[arg(long, default_value = "operator@localhost")]
        email: String,
        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Check a server's /api/health endpoint")]
    Ping {
        #[arg(long, env = "BOARDING_API_URL", default_value = "http://localhost:3000")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Seed { file, tenant } => commands::seed::handle(file, tenant, output_format).await,
        Commands::Token {
            user,
            tenant,
            role,
            email,
            hours,
        } => commands::token::handle(user, tenant, role, email, hours, output_format),
        Commands::Ping { url } => commands::ping::handle(&url, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_command() {
        let cli = Cli::try_parse_from([
            "boarding",
            "token",
            "--user",
            "6f1c2f9e-0000-4000-8000-000000000001",
            "--tenant",
            "6f1c2f9e-0000-4000-8000-000000000002",
            "--role",
            "Landlord",
            "--json",
        ])
        .unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        match cli.command {
            Commands::Token { role, email, hours, .. } => {
                assert_eq!(role, UserRole::Landlord);
                assert_eq!(email, "operator@localhost");
                assert_eq!(hours, None);
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn rejects_unknown_roles() {
        let result = Cli::try_parse_from([
            "boarding",
            "token",
            "--user",
            "6f1c2f9e-0000-4000-8000-000000000001",
            "--tenant",
            "6f1c2f9e-0000-4000-8000-000000000002",
            "--role",
            "janitor",
        ]);
        assert!(result.is_err());
    }
}
