//! Credential loading from an optional `.env` file and the process environment.
//!
//! The bot token is never stored in the TOML config; the config only names
//! the variable that holds it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

/// Credentials loaded from a `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.vars.keys().map(|key| (key, "***")))
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Resolve a secret: the `.env` value first, then `env(key)`.
    /// Blank values are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns an error when neither source provides a value.
    pub fn resolve_with(
        &self,
        key: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<String> {
        if let Some(value) = self.get(key).filter(|v| !v.trim().is_empty()) {
            debug!(key, "using credential from .env file");
            return Ok(value.to_owned());
        }
        env(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required credential: {key}"))
    }

    /// Resolve a secret from the `.env` file or the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when neither source provides a value.
    pub fn resolve(&self, key: &str) -> anyhow::Result<String> {
        self.resolve_with(key, |k| std::env::var(k).ok())
    }
}

/// Read a `.env` file that only its owner can access.
///
/// # Errors
///
/// Returns an error if the file is missing, readable by group or others, or
/// malformed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("cannot open env file {}", path.display()))?;
    ensure_owner_only(path, &metadata)?;

    let vars = dotenvy::from_path_iter(path)
        .with_context(|| format!("cannot read env file {}", path.display()))?
        .collect::<Result<BTreeMap<_, _>, _>>()
        .with_context(|| format!("malformed line in env file {}", path.display()))?;
    debug!(path = %path.display(), keys = vars.len(), "env file loaded");

    Ok(Credentials { vars })
}

/// Load credentials from `path` when given, otherwise start empty.
///
/// # Errors
///
/// Returns an error if an explicitly named file is missing or invalid.
pub fn load_optional_credentials(path: Option<&Path>) -> anyhow::Result<Credentials> {
    match path {
        Some(path) => load_credentials(path),
        None => Ok(Credentials::default()),
    }
}

#[cfg(unix)]
fn ensure_owner_only(path: &Path, metadata: &fs::Metadata) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode() & 0o777;
    anyhow::ensure!(
        mode & 0o077 == 0,
        "env file {} must be 0600, found {mode:o}",
        path.display()
    );
    Ok(())
}

#[cfg(not(unix))]
fn ensure_owner_only(_path: &Path, _metadata: &fs::Metadata) -> anyhow::Result<()> {
    Ok(())
}
