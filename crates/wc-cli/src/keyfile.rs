//! Key files on disk: one base64 key per file, trailing newline.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use zeroize::Zeroize;

use wc_crypto::KeyPair;

/// Load and validate a secret key file, returning the full key pair.
pub async fn read_keypair(path: &Path, mode_check: bool) -> Result<KeyPair> {
    if mode_check {
        warn_if_shared(path);
    }

    let mut content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading secret key: {}", path.display()))?;
    let secret = SecretString::from(content.trim().to_string());
    content.zeroize();

    KeyPair::from_secret_key(secret.expose_secret())
        .with_context(|| format!("loading secret key: {}", path.display()))
}

/// Write both halves of a key pair. Refuses to replace existing files unless
/// `force` is set. The secret file is created with mode 0600 on Unix.
pub async fn write_keypair(
    pair: &KeyPair,
    secret_path: &Path,
    public_path: &Path,
    force: bool,
) -> Result<()> {
    for path in [secret_path, public_path] {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating dir: {}", parent.display()))?;
        }
    }

    // public half first: a failure here must not leave a lone secret behind
    tokio::fs::write(public_path, format!("{}\n", pair.public_key))
        .await
        .with_context(|| format!("writing public key: {}", public_path.display()))?;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(secret_path)
        .await
        .with_context(|| format!("creating secret key file: {}", secret_path.display()))?;
    let mut line = format!("{}\n", pair.secret_key.expose_secret());
    let written = file.write_all(line.as_bytes()).await;
    line.zeroize();
    written.with_context(|| format!("writing secret key: {}", secret_path.display()))?;
    file.flush().await?;
    // mode() only applies on create; tighten a pre-existing file too
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(secret_path, std::fs::Permissions::from_mode(0o600))
            .await
            .with_context(|| format!("chmod 600: {}", secret_path.display()))?;
    }

    tracing::info!(
        secret = %secret_path.display(),
        public = %public_path.display(),
        "wrote key pair"
    );
    Ok(())
}

#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "secret key file is readable by group or others; run chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path) {}
