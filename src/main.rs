//! MedIntake command line.
//!
//! Usage:
//!   medintake [serve]
//!   medintake create-admin --username <u> [--email <e>] [--update]
//!   medintake sweep-tokens
//!   medintake vault register <username> [--dir <dir>]
//!   medintake vault list <username> [--dir <dir>]
//!
//! Passwords are read from `MEDINTAKE_ADMIN_PASSWORD` / `MEDINTAKE_VAULT_PASSWORD`
//! when set, otherwise one line at a time from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};

use medintake_lib::accounts::{self, Provisioned};
use medintake_lib::config::{self, AppConfig};
use medintake_lib::core_state::CoreState;
use medintake_lib::vault::LocalVault;
use medintake_lib::{init_tracing, run_server, sweeper};

type CliResult = Result<(), Box<dyn std::error::Error>>;

const ADMIN_PASSWORD_ENV: &str = "MEDINTAKE_ADMIN_PASSWORD";
const VAULT_PASSWORD_ENV: &str = "MEDINTAKE_VAULT_PASSWORD";

#[derive(Parser)]
#[command(name = "medintake")]
#[command(version)]
#[command(about = "Single-use medical intake links with an admin API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,

    /// Create an admin account, or update its password with --update
    CreateAdmin {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: Option<String>,

        /// Replace the password (and email when given) of an existing admin
        #[arg(long)]
        update: bool,
    },

    /// Expire every pending link whose deadline has passed, once
    SweepTokens,

    /// Standalone encrypted local vault
    Vault {
        #[command(subcommand)]
        command: VaultCommand,
    },
}

#[derive(Subcommand)]
enum VaultCommand {
    /// Register a vault user
    Register {
        username: String,

        /// Vault directory (defaults to ~/MedIntake/vault)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Print a user's records as JSON
    List {
        username: String,

        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let result: CliResult = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await.map_err(Into::into),
        Command::CreateAdmin { username, email, update } => create_admin(config, &username, email.as_deref(), update),
        Command::SweepTokens => sweep_tokens(config),
        Command::Vault { command } => run_vault(&config, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn create_admin(config: AppConfig, username: &str, email: Option<&str>, update: bool) -> CliResult {
    let password = read_secret(env_secret(ADMIN_PASSWORD_ENV), "Admin password", &mut io::stdin().lock())?;
    let iterations = config.password_iterations;
    let core = CoreState::initialize(config)?;
    let conn = core.open_db()?;
    match accounts::create_or_update_admin(&conn, username, &password, email, update, iterations, Utc::now())? {
        Provisioned::Created(admin) => println!("Admin '{}' created ({})", admin.username, admin.id),
        Provisioned::Updated(admin) => println!("Admin '{}' updated", admin.username),
        Provisioned::Unchanged(admin) => {
            println!("Admin '{}' already exists; pass --update to change its password", admin.username)
        }
    }
    Ok(())
}

fn sweep_tokens(config: AppConfig) -> CliResult {
    let core = CoreState::initialize(config)?;
    let expired = sweeper::sweep_once(&core)?;
    println!("Expired {expired} overdue link(s)");
    Ok(())
}

fn run_vault(config: &AppConfig, command: VaultCommand) -> CliResult {
    let now = Utc::now();
    match command {
        VaultCommand::Register { username, dir } => {
            let from_env = env_secret(VAULT_PASSWORD_ENV);
            let mut stdin = io::stdin().lock();
            let password = read_secret(from_env.clone(), "Vault password", &mut stdin)?;
            let confirmation = read_secret(from_env, "Confirm vault password", &mut stdin)?;
            let vault = open_vault(config, dir)?;
            vault.register(&username, &password, &confirmation, now)?;
            println!("Vault user '{}' registered in {}", username.trim(), vault.dir().display());
        }
        VaultCommand::List { username, dir } => {
            let password = read_secret(env_secret(VAULT_PASSWORD_ENV), "Vault password", &mut io::stdin().lock())?;
            let vault = open_vault(config, dir)?;
            let session = vault.login(&username, &password, now)?;
            let records = vault.list_records(&session, now)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}

fn open_vault(config: &AppConfig, dir: Option<PathBuf>) -> Result<LocalVault, medintake_lib::vault::VaultError> {
    let dir = dir.unwrap_or_else(config::default_vault_dir);
    LocalVault::open(&dir, config.password_iterations)
}

fn env_secret(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// `from_env` when present, otherwise the next line of `input` without its line ending.
fn read_secret(from_env: Option<String>, prompt: &str, input: &mut impl BufRead) -> io::Result<String> {
    if let Some(secret) = from_env {
        return Ok(secret);
    }
    eprint!("{prompt}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, format!("{prompt} not provided")));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
