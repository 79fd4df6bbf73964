//! wclaw: WhiteClaws report encryption CLI
//!
//! Commands:
//!   keygen              - generate a key pair into the key directory
//!   pubkey              - print the public key for the configured secret key
//!   seal --to <PUBKEY>  - encrypt stdin/file for a protocol, print envelope JSON
//!   open [--from <PUBKEY>] - decrypt envelope or payload JSON from stdin/file
//!   shared --with <PUBKEY> - print the shared secret with another party
//!   config show         - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use wc_crypto::{
    decrypt_bytes, encrypt_bytes, generate_keypair, generate_shared_secret, parse_public_key,
    CryptoError, EncryptedEnvelope, EncryptedPayload, KeyPair,
};

mod config;
mod keyfile;

use config::{expand_tilde, LogFormat, WclawConfig};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "wclaw",
    version,
    about = "WhiteClaws report encryption",
    long_about = "wclaw: seal vulnerability reports for a protocol's public key and open them with its secret key"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "WCLAW_CONFIG",
        default_value = "~/.config/wclaw/config.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new key pair (secret.key + public.key)
    Keygen {
        /// Directory for the key files (default: paths from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },

    /// Print the public key derived from the secret key
    Pubkey {
        /// Secret key file (overrides config)
        #[arg(long, env = "WCLAW_SECRET_KEY")]
        secret_key: Option<PathBuf>,
    },

    /// Encrypt a message for a recipient
    ///
    /// Reads the message from --in or stdin and prints envelope JSON.
    Seal {
        /// Recipient public key (base64)
        #[arg(long)]
        to: String,
        /// Input file (default: stdin)
        #[arg(long = "in")]
        input: Option<PathBuf>,
        /// Secret key file (overrides config)
        #[arg(long, env = "WCLAW_SECRET_KEY")]
        secret_key: Option<PathBuf>,
        /// Emit a versioned payload (includes sender public key) instead of a bare envelope
        #[arg(long)]
        payload: bool,
    },

    /// Decrypt envelope or payload JSON
    Open {
        /// Sender public key (base64); required for bare envelopes
        #[arg(long)]
        from: Option<String>,
        /// Input file (default: stdin)
        #[arg(long = "in")]
        input: Option<PathBuf>,
        /// Secret key file (overrides config)
        #[arg(long, env = "WCLAW_SECRET_KEY")]
        secret_key: Option<PathBuf>,
    },

    /// Print the shared secret with another party
    Shared {
        /// The other party's public key (base64)
        #[arg(long)]
        with: String,
        /// Secret key file (overrides config)
        #[arg(long, env = "WCLAW_SECRET_KEY")]
        secret_key: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = config::load(&config_path).await?;
    init_logging(&config.log.level, config.log.format());

    match cli.command {
        Commands::Keygen { out_dir, force } => cmd_keygen(&config, out_dir.as_deref(), force).await,
        Commands::Pubkey { secret_key } => cmd_pubkey(&config, secret_key.as_deref()).await,
        Commands::Seal { to, input, secret_key, payload } => {
            cmd_seal(&config, &to, input.as_deref(), secret_key.as_deref(), payload).await
        }
        Commands::Open { from, input, secret_key } => {
            cmd_open(&config, from.as_deref(), input.as_deref(), secret_key.as_deref()).await
        }
        Commands::Shared { with, secret_key } => {
            cmd_shared(&config, &with, secret_key.as_deref()).await
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
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

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Load the key pair: CLI flag > config path
async fn load_keypair(config: &WclawConfig, override_path: Option<&Path>) -> Result<KeyPair> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => expand_tilde(&config.keys.secret_key_file),
    };
    keyfile::read_keypair(&path, config.keys.secret_key_mode_check).await
}

async fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading input: {}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

// ── `wclaw keygen` ────────────────────────────────────────────────────────────

async fn cmd_keygen(config: &WclawConfig, out_dir: Option<&Path>, force: bool) -> Result<()> {
    let (secret_path, public_path) = match out_dir {
        Some(dir) => (dir.join("secret.key"), dir.join("public.key")),
        None => (
            expand_tilde(&config.keys.secret_key_file),
            expand_tilde(&config.keys.public_key_file),
        ),
    };

    let pair = generate_keypair().context("generating key pair")?;
    keyfile::write_keypair(&pair, &secret_path, &public_path, force).await?;

    eprintln!("secret key: {}", secret_path.display());
    eprintln!("public key: {}", public_path.display());
    println!("{}", pair.public_key);
    Ok(())
}

// ── `wclaw pubkey` ────────────────────────────────────────────────────────────

async fn cmd_pubkey(config: &WclawConfig, secret_key: Option<&Path>) -> Result<()> {
    let pair = load_keypair(config, secret_key).await?;
    println!("{}", pair.public_key);
    Ok(())
}

// ── `wclaw seal` ──────────────────────────────────────────────────────────────

async fn cmd_seal(
    config: &WclawConfig,
    to: &str,
    input: Option<&Path>,
    secret_key: Option<&Path>,
    as_payload: bool,
) -> Result<()> {
    parse_public_key(to).context("--to")?;
    let pair = load_keypair(config, secret_key).await?;
    let message = read_input(input).await?;

    let json = if as_payload {
        let payload = EncryptedPayload::seal_bytes(&message, to, &pair)?;
        serde_json::to_string_pretty(&payload)?
    } else {
        let envelope = encrypt_bytes(&message, to, pair.secret_key.expose_secret())?;
        serde_json::to_string_pretty(&envelope)?
    };

    tracing::debug!(bytes = message.len(), payload = as_payload, "sealed message");
    println!("{json}");
    Ok(())
}

// ── `wclaw open` ──────────────────────────────────────────────────────────────

/// Input accepted by `open`: a versioned payload carries the sender key.
enum Sealed {
    Payload(EncryptedPayload),
    Envelope(EncryptedEnvelope),
}

fn parse_sealed(data: &[u8]) -> Result<Sealed> {
    let value: serde_json::Value = serde_json::from_slice(data).context("input is not JSON")?;
    if value.get("version").is_some() {
        let payload = serde_json::from_value(value).context("parsing payload JSON")?;
        Ok(Sealed::Payload(payload))
    } else {
        let envelope = serde_json::from_value(value).context("parsing envelope JSON")?;
        Ok(Sealed::Envelope(envelope))
    }
}

/// Open parsed input. `None` covers every failure an attacker can cause,
/// including a malformed sender key embedded in a payload.
fn open_sealed(sealed: Sealed, from: Option<&str>, secret: &str) -> Result<Option<Vec<u8>>> {
    match sealed {
        Sealed::Payload(payload) => {
            if let Some(expected) = from {
                if expected.trim() != payload.sender_public_key {
                    anyhow::bail!("payload sender does not match --from");
                }
            }
            match payload.open_bytes(secret) {
                Err(CryptoError::KeyFormat { role: "sender public key", .. }) => Ok(None),
                other => Ok(other?),
            }
        }
        Sealed::Envelope(envelope) => {
            let from = from.context("--from <PUBKEY> is required to open a bare envelope")?;
            Ok(decrypt_bytes(&envelope.ciphertext, &envelope.nonce, from, secret)?)
        }
    }
}

async fn cmd_open(
    config: &WclawConfig,
    from: Option<&str>,
    input: Option<&Path>,
    secret_key: Option<&Path>,
) -> Result<()> {
    let pair = load_keypair(config, secret_key).await?;
    let sealed = parse_sealed(&read_input(input).await?)?;
    let opened = open_sealed(sealed, from, pair.secret_key.expose_secret())?;

    let Some(plaintext) = opened else {
        anyhow::bail!("decryption failed");
    };

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&plaintext).await.context("writing stdout")?;
    stdout.flush().await?;
    Ok(())
}

// ── `wclaw shared` ────────────────────────────────────────────────────────────

async fn cmd_shared(config: &WclawConfig, with: &str, secret_key: Option<&Path>) -> Result<()> {
    let pair = load_keypair(config, secret_key).await?;
    let shared = generate_shared_secret(with, pair.secret_key.expose_secret())?;
    println!("{shared}");
    Ok(())
}

// ── `wclaw config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &WclawConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
