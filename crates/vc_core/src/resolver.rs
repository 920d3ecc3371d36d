use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use vc_git::{FetchOutcome, FetchStep, SignedCommit};
use vc_gpg::ImportOutcome;

use crate::window::FetchWindow;

/// History access the loop needs from the repository mirror.
pub trait CommitHistory {
    fn default_branch(&self) -> anyhow::Result<Option<String>>;
    fn fetch(&self, step: FetchStep) -> anyhow::Result<FetchOutcome>;
    fn committer_emails(&self, branch: &str) -> anyhow::Result<BTreeSet<String>>;
    fn latest_verified_commit(&self, branch: &str) -> anyhow::Result<Option<SignedCommit>>;
    fn checkout(&self, oid: &str) -> anyhow::Result<()>;
}

/// Identity lookup: committer email to account ids, account id to the
/// account's primary public key.
pub trait KeyDirectory {
    fn resolve_user_ids(&self, email: &str) -> Vec<u64>;
    fn public_key(&self, uid: u64) -> Option<String>;
}

/// Sink for public key material.
pub trait KeyImport {
    fn import(&self, key_material: &str) -> anyhow::Result<ImportOutcome>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The transport had nothing to send: the remote holds no history beyond
    /// what is already visible, so no amount of deepening can help.
    #[error("no new commits found on server")]
    NoNewCommits,
    #[error("no verified commit within the last {depth} commits")]
    NoVerifiedCommit { depth: u32 },
    #[error("remote advertises no default branch and none was supplied")]
    DefaultBranchUnknown,
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

/// The progressive trust-resolution loop.
///
/// Deepens visible history in doubling steps, resolves newly seen committer
/// identities to public keys through the directory, imports them, and
/// re-scans for the newest commit whose signature now verifies. Each email
/// is looked up and imported at most once per run; the first verifiable
/// commit found is checked out and ends the run.
pub struct TrustResolver<H, D, K> {
    history: H,
    directory: D,
    keyring: K,
    branch: Option<String>,
}

impl<H, D, K> TrustResolver<H, D, K>
where
    H: CommitHistory,
    D: KeyDirectory,
    K: KeyImport,
{
    pub fn new(history: H, directory: D, keyring: K) -> Self {
        Self {
            history,
            directory,
            keyring,
            branch: None,
        }
    }

    /// Inspect `branch` instead of the remote's advertised HEAD branch.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn resolve(&self) -> Result<SignedCommit, ResolveError> {
        let branch = match &self.branch {
            Some(branch) => branch.clone(),
            None => self
                .history
                .default_branch()?
                .ok_or(ResolveError::DefaultBranchUnknown)?,
        };
        info!(branch = %branch, "resolving newest verified commit");

        let mut window = FetchWindow::new();
        let mut imported = BTreeSet::new();
        let mut rejected = BTreeSet::new();
        loop {
            debug!(depth = window.depth(), "fetching history");
            let outcome = self.history.fetch(window.step())?;
            if outcome.no_new_objects() {
                return Err(ResolveError::NoNewCommits);
            }

            for email in self.history.committer_emails(&branch)? {
                if imported.contains(&email) || rejected.contains(&email) {
                    continue;
                }
                if let Some(commit) =
                    self.classify(&branch, &email, &mut imported, &mut rejected)?
                {
                    info!(oid = %commit.oid, status = commit.status.label(), "found verified commit");
                    self.history.checkout(&commit.oid)?;
                    return Ok(commit);
                }
            }

            if window.at_limit() {
                return Err(ResolveError::NoVerifiedCommit {
                    depth: window.depth(),
                });
            }
            window.widen();
        }
    }

    /// Resolve one not-yet-classified email to key material, import it, and
    /// re-scan for a verifiable commit. The email lands in exactly one of
    /// the two classification sets and is never looked up again this run.
    fn classify(
        &self,
        branch: &str,
        email: &str,
        imported: &mut BTreeSet<String>,
        rejected: &mut BTreeSet<String>,
    ) -> Result<Option<SignedCommit>, ResolveError> {
        for uid in self.directory.resolve_user_ids(email) {
            let Some(key_material) = self.directory.public_key(uid) else {
                continue;
            };
            // Only the account's first published key is consumed.
            let outcome = self.keyring.import(&key_material)?;
            if outcome.imported_usable() {
                info!(email, uid, "imported public key");
                imported.insert(email.to_string());
            } else {
                warn!(
                    email,
                    uid,
                    diagnostic = outcome.diagnostic().trim(),
                    "key material rejected by keyring"
                );
                rejected.insert(email.to_string());
            }
            // A fresh key may validate a commit signed under a different,
            // cross-signed identity; re-scan after every import attempt.
            return Ok(self.history.latest_verified_commit(branch)?);
        }
        debug!(email, "no key material found in directory");
        rejected.insert(email.to_string());
        Ok(None)
    }
}
