//! Key-import sink backed by the `gpg` binary.
//!
//! The keyring is append-only within a run, and the default keyring persists
//! across runs so repeated CI invocations skip redundant imports.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

/// Marker gpg prints when the supplied material contains nothing importable.
/// gpg can exit zero while importing nothing usable, so the marker has to be
/// checked in addition to the exit status.
pub const INVALID_DATA_MARKER: &str = "no valid OpenPGP data found";

#[derive(Debug, Default)]
pub struct Keyring {
    gnupg_home: Option<PathBuf>,
}

impl Keyring {
    /// Use the process-wide default keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an isolated GNUPGHOME instead of the default keyring.
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        Self {
            gnupg_home: Some(home.as_ref().to_path_buf()),
        }
    }

    /// Import one armored public key blob and report the engine's verdict.
    /// A failure to spawn or stream is an environment fault; a completed run
    /// always yields an [`ImportOutcome`], however unusable.
    pub fn import(&self, key_material: &str) -> Result<ImportOutcome> {
        let mut command = Command::new("gpg");
        command
            .args(["--batch", "--import"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(home) = &self.gnupg_home {
            command.env("GNUPGHOME", home);
        }

        let mut child = command.spawn().context("failed to run gpg --import")?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(key_material.as_bytes())
                .context("failed to stream key material to gpg")?;
        }
        let output = child
            .wait_with_output()
            .context("failed to collect gpg --import output")?;

        let outcome = ImportOutcome::new(
            output.status.success(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        );
        debug!(success = outcome.success(), "gpg import finished");
        Ok(outcome)
    }
}

/// Result of one import attempt: the engine's exit status plus its
/// diagnostic text.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    success: bool,
    diagnostic: String,
}

impl ImportOutcome {
    pub fn new(success: bool, diagnostic: impl Into<String>) -> Self {
        Self {
            success,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    /// A usable import requires both a clean exit and the absence of the
    /// invalid-data marker.
    pub fn imported_usable(&self) -> bool {
        self.success && !self.diagnostic.contains(INVALID_DATA_MARKER)
    }
}
