use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use dilithium_signer_cli::commands::{self, App};
use dilithium_signer_cli::config::{load_config, BackendChoice, Config, ConfigFormat};
use dilithium_signer_cli::git::GitCli;
use dilithium_signer_core::{SecurityLevel, UnsupportedLevel};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "dilithium-signer",
    version,
    about = "Sign and verify git commits with Dilithium post-quantum signatures"
)]
struct Cli {
    /// Directory holding the local key and the public key registry.
    #[arg(long, global = true, env = "DILITHIUM_SIGNER_HOME")]
    home: Option<PathBuf>,
    /// Optional configuration file (TOML or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Explicit configuration format override.
    #[arg(long, global = true, value_enum, default_value_t = ConfigFormat::Auto)]
    config_format: ConfigFormat,
    /// Override the signature backend named in the config file.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendChoice>,
    /// Git working directory.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,
    /// Log key sizes, fingerprints and git invocations.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a keypair and install the post-commit hook.
    Init(KeygenArgs),
    /// Generate a keypair without touching the repository.
    Keygen(KeygenArgs),
    /// Sign a commit and attach the signature as a git note.
    Sign {
        #[arg(default_value = "HEAD")]
        rev: String,
    },
    /// Verify a commit's signature against the registry.
    Verify {
        #[arg(default_value = "HEAD")]
        rev: String,
    },
    /// Write the local public key to a file for a teammate.
    ExportKey {
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Add a teammate's exported public key to the registry.
    ImportKey { file: PathBuf },
    /// Install the post-commit hook that signs every new commit.
    SetupHook,
    /// List registered identities.
    ListKeys,
}

#[derive(Debug, clap::Args)]
struct KeygenArgs {
    /// Security level: 2, 3 or 5 (defaults to the configured level).
    #[arg(long, value_parser = parse_level)]
    level: Option<SecurityLevel>,
    /// Identity the key is registered under.
    #[arg(long)]
    email: String,
    /// Replace an existing key without asking.
    #[arg(long, short)]
    yes: bool,
}

fn parse_level(tag: &str) -> Result<SecurityLevel, UnsupportedLevel> {
    tag.parse()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => load_config(path, cli.config_format)?,
        None => Config::default(),
    };
    if let Some(backend) = cli.backend {
        config.signer.backend = backend;
    }
    config.validate()?;

    let paths = config.paths(cli.home.as_deref())?;
    let git = GitCli::new(&cli.repo, config.signer.notes_ref.clone());
    let app = App::new(paths, config.signer.backend.into(), git);

    match cli.command {
        Command::Init(args) => {
            let level = args.level.unwrap_or(config.signer.default_level);
            println!("{}", app.init(level, &args.email, args.yes)?);
        }
        Command::Keygen(args) => {
            let level = args.level.unwrap_or(config.signer.default_level);
            println!("{}", app.keygen(level, &args.email, args.yes)?);
        }
        Command::Sign { rev } => {
            println!("{}", commands::describe_signed(&app.sign(&rev)?));
        }
        Command::Verify { rev } => {
            let verification = app.verify(&rev)?;
            println!("{}", commands::describe_verification(&rev, &verification));
            if !verification.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::ExportKey { output } => {
            let transfer = app.export_key(&output)?;
            println!(
                "Exported public key for {} to {}",
                transfer.email,
                output.display()
            );
        }
        Command::ImportKey { file } => {
            let entry = app.import_key(&file)?;
            println!("Imported {}", commands::describe_entry(&entry));
        }
        Command::SetupHook => {
            println!("Installed post-commit hook at {}", app.setup_hook()?.display());
        }
        Command::ListKeys => {
            for entry in app.list_keys()? {
                println!("{}", commands::describe_entry(&entry));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn level_flag_accepts_known_tags() {
        let cli = Cli::try_parse_from([
            "dilithium-signer",
            "keygen",
            "--level",
            "5",
            "--email",
            "alice@example.com",
        ])
        .unwrap();
        match cli.command {
            Command::Keygen(args) => assert_eq!(args.level, Some(SecurityLevel::Level5)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_level_is_rejected_at_parse_time() {
        for tag in ["7", "0", " 2", "two"] {
            let err = Cli::try_parse_from([
                "dilithium-signer",
                "init",
                "--level",
                tag,
                "--email",
                "alice@example.com",
            ])
            .unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
            assert!(
                err.to_string().contains("unsupported security level"),
                "unexpected message for {tag:?}: {err}"
            );
        }
    }

    #[test]
    fn verify_defaults_to_head() {
        let cli = Cli::try_parse_from(["dilithium-signer", "verify"]).unwrap();
        assert!(matches!(cli.command, Command::Verify { rev } if rev == "HEAD"));
    }
}
