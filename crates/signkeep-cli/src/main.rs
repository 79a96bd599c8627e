//! signkeep: signing-password protection for build pipelines
//!
//! Commands:
//!   encrypt <password> [<material>]  - create material if absent, print the password blob as hex
//!   decrypt <hex> [<material>]       - create material if absent, print the decrypted password
//!   init [<material>]                - create material if absent
//!   verify [<material>]              - check that existing material is complete and unwraps
//!
//! A password or blob of `-` is read from the terminal without echo.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing::info;

use signkeep_core::SignkeepConfig;
use signkeep_material::KeyMaterialManager;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "signkeep",
    version,
    about = "Split-key protection for app signing passwords",
    long_about = "signkeep: encrypt and decrypt signing passwords with a working key \
                  protected by key shares spread across a material directory"
)]
struct Cli {
    /// Path to signkeep.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "SIGNKEEP_CONFIG",
        default_value = "/etc/signkeep/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "SIGNKEEP_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides the config file
    #[arg(long, env = "SIGNKEEP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a signing password and print the blob as hex
    Encrypt {
        /// Password to encrypt (`-` to prompt)
        password: String,
        /// Material directory (default: config material.path)
        #[arg(env = "SIGNKEEP_MATERIAL")]
        material: Option<PathBuf>,
    },

    /// Decrypt a hex blob produced by `encrypt`
    Decrypt {
        /// Hex-encoded password blob (`-` to prompt)
        blob: String,
        /// Material directory (default: config material.path)
        #[arg(env = "SIGNKEEP_MATERIAL")]
        material: Option<PathBuf>,
    },

    /// Create the material directory if it does not exist
    Init {
        /// Material directory (default: config material.path)
        #[arg(env = "SIGNKEEP_MATERIAL")]
        material: Option<PathBuf>,
    },

    /// Check that the material directory is complete and consistent
    Verify {
        /// Material directory (default: config material.path)
        #[arg(env = "SIGNKEEP_MATERIAL")]
        material: Option<PathBuf>,
    },
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SignkeepConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format.clone() {
        Some(format) => format,
        None => <LogFormat as ValueEnum>::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("invalid log.format in config: {e}"))?,
    };
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "signkeep starting"
    );

    let manager = KeyMaterialManager::from_config(&config).context("invalid [material] config")?;

    match cli.command {
        Commands::Encrypt { password, material } => {
            let path = resolve_material(&config, material)?;
            cmd_encrypt(&manager, &password, &path)
        }
        Commands::Decrypt { blob, material } => {
            let path = resolve_material(&config, material)?;
            cmd_decrypt(&manager, &blob, &path)
        }
        Commands::Init { material } => {
            let path = resolve_material(&config, material)?;
            cmd_init(&manager, &path)
        }
        Commands::Verify { material } => {
            let path = resolve_material(&config, material)?;
            cmd_verify(&manager, &path)
        }
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the command result only
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Material path: positional argument > `SIGNKEEP_MATERIAL` > config `material.path`
fn resolve_material(config: &SignkeepConfig, arg: Option<PathBuf>) -> Result<PathBuf> {
    arg.or_else(|| config.material.path.clone()).context(
        "no material directory given\n\
         Pass it as an argument, set SIGNKEEP_MATERIAL, or set material.path in the config file",
    )
}

/// Read a secret argument, prompting without echo when it is `-`.
fn read_secret(value: &str, prompt: &str) -> Result<SecretString> {
    if value == "-" {
        let entered = rpassword::prompt_password(prompt).context("reading from terminal")?;
        Ok(SecretString::from(entered))
    } else {
        Ok(SecretString::from(value.to_owned()))
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_encrypt(manager: &KeyMaterialManager, password: &str, path: &Path) -> Result<()> {
    let password = read_secret(password, "Password: ")?;
    manager
        .ensure_material(path)
        .with_context(|| format!("preparing material: {}", path.display()))?;
    let hex_blob = manager
        .encrypt_password(&password, path)
        .with_context(|| format!("encrypting with material: {}", path.display()))?;
    println!("{hex_blob}");
    Ok(())
}

fn cmd_decrypt(manager: &KeyMaterialManager, blob: &str, path: &Path) -> Result<()> {
    let blob = read_secret(blob, "Encrypted password (hex): ")?;
    manager
        .ensure_material(path)
        .with_context(|| format!("preparing material: {}", path.display()))?;
    let password = manager
        .decrypt_password(blob.expose_secret(), path)
        .with_context(|| format!("decrypting with material: {}", path.display()))?;
    println!("{}", password.expose_secret());
    Ok(())
}

fn cmd_init(manager: &KeyMaterialManager, path: &Path) -> Result<()> {
    let created = manager
        .ensure_material(path)
        .with_context(|| format!("creating material: {}", path.display()))?;
    if created {
        println!("Created material directory: {}", path.display());
    } else {
        println!("Material directory already exists: {}", path.display());
    }
    Ok(())
}

fn cmd_verify(manager: &KeyMaterialManager, path: &Path) -> Result<()> {
    manager
        .verify(path)
        .with_context(|| format!("verifying material: {}", path.display()))?;
    println!("Material OK: {}", path.display());
    Ok(())
}
