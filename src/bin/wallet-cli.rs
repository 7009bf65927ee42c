use std::io::{self, IsTerminal, Write};

use anyhow::Context;
use clap::Parser;
use sol_hd_keyring::cli::{self, Cli, Commands};
use sol_hd_keyring::core::engine::KeyEngine;
use sol_hd_keyring::security::SecretString;
use sol_hd_keyring::service::WalletService;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

/// Phrase source for `derive`: this variable first, then stdin.
const PHRASE_ENV: &str = "WALLET_PHRASE";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = cli::load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Generate(args) => {
            let service = WalletService::from_config(&config)?;
            if args.show_phrase && !io::stdout().is_terminal() {
                tracing::warn!("Printing recovery phrase to a non-terminal stdout");
            }
            cli::run_generate(&service, &args, &mut out)?;
        }
        Commands::Derive(args) => {
            let engine = KeyEngine::from_config(&config)?;
            let phrase = resolve_phrase()?;
            let passphrase = match &args.passphrase_env {
                Some(var) => Zeroizing::new(
                    std::env::var(var).with_context(|| format!("read passphrase from ${}", var))?,
                ),
                None => Zeroizing::new(String::new()),
            };
            cli::run_derive(&engine, &args, &phrase, &passphrase, &mut out)?;
        }
        Commands::Validate => {
            let engine = KeyEngine::from_config(&config)?;
            let phrase = cli::read_phrase(io::stdin().lock()).context("read phrase from stdin")?;
            let valid = cli::run_validate(&engine, &phrase, &mut out)?;
            out.flush()?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Session => {
            let service = WalletService::from_config(&config)?;
            tracing::info!("Session started");
            cli::run_session(&service, io::stdin().lock(), &mut out)?;
            tracing::info!("Session ended");
        }
    }

    out.flush()?;
    Ok(())
}

fn resolve_phrase() -> anyhow::Result<SecretString> {
    if let Ok(phrase) = std::env::var(PHRASE_ENV) {
        return Ok(Zeroizing::new(phrase));
    }
    cli::read_phrase(io::stdin().lock()).context("read phrase from stdin")
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
