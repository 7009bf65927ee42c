//! Command-line presentation layer.
//!
//! Argument definitions live here so integration tests can parse them, and
//! each subcommand writes to a caller-supplied `Write` so it can run against a
//! buffer instead of stdout.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::core::config::WalletConfig;
use crate::core::derivation::HARDENED_OFFSET;
use crate::core::engine::KeyEngine;
use crate::core::errors::WalletError;
use crate::core::registry::Identity;
use crate::security::secret::SecretString;
use crate::service::WalletService;

/// Deterministic Solana HD keyring
#[derive(Debug, Parser)]
#[command(name = "wallet-cli", about = "Deterministic Solana HD keyring", disable_help_subcommand = true)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a new recovery phrase and its first identities
    Generate(GenerateArgs),
    /// Derive identities from a phrase read from WALLET_PHRASE or stdin
    Derive(DeriveArgs),
    /// Check a phrase read from stdin; exits non-zero when invalid
    Validate,
    /// Line-oriented registry session on stdin
    Session,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Number of words (12, 15, 18, 21 or 24); config default when omitted
    #[arg(long)]
    pub words: Option<usize>,
    /// Number of identities to derive
    #[arg(long, default_value_t = 1)]
    pub count: u32,
    /// Print the recovery phrase in plaintext
    #[arg(long)]
    pub show_phrase: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DeriveArgs {
    /// Number of identities to derive
    #[arg(long, default_value_t = 1)]
    pub count: u32,
    /// First account index
    #[arg(long, default_value_t = 0)]
    pub from: u32,
    /// Environment variable holding the BIP39 passphrase
    #[arg(long)]
    pub passphrase_env: Option<String>,
    #[arg(long)]
    pub json: bool,
}

/// Config file when given, defaults otherwise; `WALLET_*` overrides apply to both.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<WalletConfig> {
    let config = match path {
        Some(path) => WalletConfig::load(path)
            .with_context(|| format!("load config from {}", path.display()))?,
        None => WalletConfig::from_env().context("read WALLET_* environment overrides")?,
    };
    Ok(config)
}

/// First non-blank line of `input`, trimmed, in a zeroizing buffer.
pub fn read_phrase<R: BufRead>(input: R) -> io::Result<SecretString> {
    for line in input.lines() {
        let line = Zeroizing::new(line?);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Zeroizing::new(trimmed.to_owned()));
        }
    }
    Ok(Zeroizing::new(String::new()))
}

pub fn run_generate<W: Write>(
    service: &WalletService,
    args: &GenerateArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    let created = match args.words {
        Some(words) => service.create_wallet(words)?,
        None => service.create_default_wallet()?,
    };
    for _ in 1..args.count.max(1) {
        service.add_identity()?;
    }
    let identities = service.list_identities();
    let word_count = created.phrase.split(' ').count();
    info!(word_count, count = identities.len(), "Generated wallet");

    if args.json {
        let mut value = json!({ "word_count": word_count, "identities": identities });
        if args.show_phrase {
            value["phrase"] = json!(created.phrase.as_str());
        }
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        if args.show_phrase {
            writeln!(out, "phrase: {}", created.phrase.as_str())?;
        }
        write_identities(out, &identities)?;
    }
    if !args.show_phrase {
        warn!("Recovery phrase not shown; rerun with --show-phrase to print it");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DerivedRow {
    index: u32,
    path: String,
    public_key: String,
}

pub fn run_derive<W: Write>(
    engine: &KeyEngine,
    args: &DeriveArgs,
    phrase: &str,
    passphrase: &str,
    out: &mut W,
) -> anyhow::Result<()> {
    let phrase = engine.codec().parse(phrase)?;
    let seed = engine.master_seed(&phrase, passphrase);

    let end = args
        .from
        .checked_add(args.count)
        .filter(|end| *end <= HARDENED_OFFSET)
        .ok_or_else(|| {
            WalletError::InvalidPath(format!(
                "--from {} --count {} runs past the last hardened account index",
                args.from, args.count
            ))
        })?;
    let mut rows = Vec::new();
    for index in args.from..end {
        let path = engine.path_for(index)?;
        let public_key = engine.derive_identity(&seed, index)?;
        rows.push(DerivedRow { index, path: path.to_string(), public_key: public_key.to_base58() });
    }

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        for row in &rows {
            writeln!(out, "{}\t{}\t{}", row.index, row.path, row.public_key)?;
        }
    }
    Ok(())
}

/// Prints the verdict and returns whether the phrase is valid.
pub fn run_validate<W: Write>(engine: &KeyEngine, phrase: &str, out: &mut W) -> anyhow::Result<bool> {
    match engine.codec().parse(phrase) {
        Ok(parsed) => {
            writeln!(out, "valid ({} words)", parsed.word_count())?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "invalid: {}", e)?;
            Ok(false)
        }
    }
}

/// One line of session input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Create(Option<usize>),
    Add,
    Remove(u32),
    List,
    Export,
    Reset,
    Verify,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", name));
        }

        let command = match (name, arg) {
            ("create", None) => SessionCommand::Create(None),
            ("create", Some(n)) => SessionCommand::Create(Some(
                n.parse().map_err(|_| format!("'{}' is not a word count", n))?,
            )),
            ("add", None) => SessionCommand::Add,
            ("remove", Some(i)) => SessionCommand::Remove(
                i.parse().map_err(|_| format!("'{}' is not an account index", i))?,
            ),
            ("remove", None) => return Err("usage: remove <index>".into()),
            ("list", None) => SessionCommand::List,
            ("export", None) => SessionCommand::Export,
            ("reset", None) => SessionCommand::Reset,
            ("verify", None) => SessionCommand::Verify,
            ("help", None) => SessionCommand::Help,
            ("quit" | "exit", None) => SessionCommand::Quit,
            (other, None) => return Err(format!("unknown command '{}'", other)),
            (other, Some(_)) => return Err(format!("'{}' takes no argument", other)),
        };
        Ok(command)
    }
}

const SESSION_HELP: &str = "commands: create [words], add, remove <index>, list, export, reset, verify, quit";

/// Reads commands until `quit` or end of input. Failed commands print
/// `error: ...` and the session continues.
pub fn run_session<R: BufRead, W: Write>(
    service: &WalletService,
    input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = Zeroizing::new(line?);
        if line.trim().is_empty() {
            continue;
        }
        let command = match SessionCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "error: {}", message)?;
                continue;
            }
        };
        if command == SessionCommand::Quit {
            break;
        }
        if let Err(e) = execute(service, command, out)? {
            writeln!(out, "error: {}", e)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Outer error is I/O on `out`, inner is the registry's answer.
fn execute<W: Write>(
    service: &WalletService,
    command: SessionCommand,
    out: &mut W,
) -> io::Result<Result<(), WalletError>> {
    let result = match command {
        SessionCommand::Create(words) => {
            let created = match words {
                Some(words) => service.create_wallet(words),
                None => service.create_default_wallet(),
            };
            match created {
                Ok(created) => {
                    writeln!(out, "created {}-word wallet", created.phrase.split(' ').count())?;
                    writeln!(out, "0 {}", created.first_public_key)?;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        SessionCommand::Add => match service.add_identity() {
            Ok(identity) => {
                writeln!(out, "{} {}", identity.index, identity.public_key)?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        SessionCommand::Remove(index) => match service.remove_identity(index) {
            Ok(()) => {
                writeln!(out, "removed {}", index)?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        SessionCommand::List => {
            let identities = service.list_identities();
            if identities.is_empty() {
                writeln!(out, "(empty)")?;
            }
            write_identities(out, &identities)?;
            Ok(())
        }
        SessionCommand::Export => match service.export_phrase() {
            Ok(phrase) => {
                writeln!(out, "{}", phrase.as_str())?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        SessionCommand::Reset => {
            service.reset_wallet();
            writeln!(out, "reset")?;
            Ok(())
        }
        SessionCommand::Verify => match service.verify_identities() {
            Ok(()) => {
                writeln!(out, "ok")?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        SessionCommand::Help => {
            writeln!(out, "{}", SESSION_HELP)?;
            Ok(())
        }
        SessionCommand::Quit => Ok(()),
    };
    Ok(result)
}

fn write_identities<W: Write>(out: &mut W, identities: &[Identity]) -> io::Result<()> {
    for identity in identities {
        writeln!(out, "{} {}", identity.index, identity.public_key)?;
    }
    Ok(())
}
