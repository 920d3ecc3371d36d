use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::commit::{parse_signature_log, SignedCommit};
use crate::fetch::{fetch_jobs, FetchOutcome, FetchStep};

/// A local mirror of one remote repository, used to inspect its recent
/// history. Holds no open handles; every operation runs against the working
/// directory so refs written by the fetch plumbing are always picked up.
#[derive(Debug)]
pub struct Repository {
    workdir: PathBuf,
    committer_filter: String,
}

impl Repository {
    /// Open the repository at `target_dir`, initializing a fresh one wired to
    /// `remote_url` if none exists there. The directory is created (with
    /// parents) when missing. An existing repository is reused as-is and the
    /// URL is not re-validated.
    pub fn init_or_open(target_dir: &Path, remote_url: Option<&str>) -> Result<Self> {
        fs::create_dir_all(target_dir)
            .with_context(|| format!("failed to create {}", target_dir.display()))?;

        let repo = Self {
            workdir: target_dir.to_path_buf(),
            committer_filter: String::new(),
        };

        if target_dir.join(".git").is_dir() {
            info!(path = %target_dir.display(), "using existing repository");
        } else {
            let url = remote_url.with_context(|| {
                format!(
                    "no previous checkout at {} and no remote URL provided",
                    target_dir.display()
                )
            })?;
            info!(path = %target_dir.display(), url, "initializing repository");
            repo.git(&["init", "-b", "main"])?;
            repo.git(&["remote", "add", "--no-tags", "origin", url])?;
            // Commits are verified with OpenPGP keys only; never consult an
            // SSH allowed-signers list.
            repo.git(&["config", "gpg.ssh.allowedSignersFile", "/dev/null"])?;
        }

        Ok(repo)
    }

    /// Only committers whose name or email contains `filter` are considered
    /// when enumerating identities. An empty filter matches everyone.
    pub fn with_committer_filter(mut self, filter: impl Into<String>) -> Self {
        self.committer_filter = filter.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Fetch from `origin`, either establishing the initial shallow window or
    /// extending an existing one. Returns the transport transcript for the
    /// caller to inspect.
    pub fn fetch(&self, step: FetchStep) -> Result<FetchOutcome> {
        let mut args: Vec<String> = [
            "fetch",
            "origin",
            "--no-tags",
            "--no-show-forced-updates",
            "--progress",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("--jobs={}", fetch_jobs()));
        match step {
            FetchStep::Initial { depth } => args.push(format!("--depth={depth}")),
            FetchStep::Deepen { by } => args.push(format!("--deepen={by}")),
        }

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git fetch")?;
        let transcript = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            anyhow::bail!("git fetch failed: {}", transcript.trim());
        }
        debug!(?step, "fetched");
        Ok(FetchOutcome::new(transcript))
    }

    /// The branch the remote advertises as its HEAD, if any.
    pub fn default_branch(&self) -> Result<Option<String>> {
        let output = self.git(&["remote", "show", "origin"])?;
        Ok(parse_head_branch(&output))
    }

    /// Unique committer emails reachable from `origin/<branch>`, restricted
    /// to the configured committer filter and sorted for deterministic
    /// iteration.
    pub fn committer_emails(&self, branch: &str) -> Result<BTreeSet<String>> {
        let repo = gix::open(&self.workdir).with_context(|| {
            format!(
                "failed to open git repository at {}",
                self.workdir.display()
            )
        })?;
        let ref_name = format!("refs/remotes/origin/{branch}");
        let Some(mut reference) = repo.try_find_reference(&ref_name)? else {
            return Ok(BTreeSet::new());
        };
        let head_id = reference.peel_to_id_in_place()?;
        let walk = repo.rev_walk([head_id]).all()?;

        let mut emails = BTreeSet::new();
        for info in walk {
            let info = info?;
            let commit = info.object()?;
            let committer = commit.committer()?;
            let name = committer.name.to_string();
            let email = committer.email.to_string();
            if self.committer_filter.is_empty()
                || name.contains(&self.committer_filter)
                || email.contains(&self.committer_filter)
            {
                emails.insert(email);
            }
        }
        Ok(emails)
    }

    /// The newest commit reachable from `origin/<branch>` whose signature
    /// verifies against the keys currently in the keyring.
    pub fn latest_verified_commit(&self, branch: &str) -> Result<Option<SignedCommit>> {
        let log = self.git(&["log", &format!("origin/{branch}"), "--pretty=%G? %H"])?;
        Ok(parse_signature_log(&log)
            .into_iter()
            .find(|commit| commit.status.is_verified()))
    }

    /// Move the working tree to `oid`. Failure here is an environment fault
    /// and propagates; it is never interpreted as a trust decision.
    pub fn checkout(&self, oid: &str) -> Result<()> {
        anyhow::ensure!(
            oid.len() == 40 && oid.bytes().all(|b| b.is_ascii_hexdigit()),
            "invalid commit OID: {oid}"
        );
        self.git(&["checkout", oid])?;
        info!(oid, "checked out");
        Ok(())
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("failed to run git {}", args.join(" ")))?;
        if !output.status.success() {
            anyhow::bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the `HEAD branch:` line out of `git remote show origin` output.
/// `(unknown)` means the remote advertises no HEAD.
pub fn parse_head_branch(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let branch = line.trim().strip_prefix("HEAD branch:")?.trim();
        (!branch.is_empty() && branch != "(unknown)").then(|| branch.to_string())
    })
}
