//! Wires the concrete service crates into the loop's seams.

use std::collections::BTreeSet;

use vc_directory::DirectoryClient;
use vc_git::{FetchOutcome, FetchStep, Repository, SignedCommit};
use vc_gpg::{ImportOutcome, Keyring};

use crate::resolver::{CommitHistory, KeyDirectory, KeyImport};

impl CommitHistory for Repository {
    fn default_branch(&self) -> anyhow::Result<Option<String>> {
        Repository::default_branch(self)
    }

    fn fetch(&self, step: FetchStep) -> anyhow::Result<FetchOutcome> {
        Repository::fetch(self, step)
    }

    fn committer_emails(&self, branch: &str) -> anyhow::Result<BTreeSet<String>> {
        Repository::committer_emails(self, branch)
    }

    fn latest_verified_commit(&self, branch: &str) -> anyhow::Result<Option<SignedCommit>> {
        Repository::latest_verified_commit(self, branch)
    }

    fn checkout(&self, oid: &str) -> anyhow::Result<()> {
        Repository::checkout(self, oid)
    }
}

impl KeyDirectory for DirectoryClient {
    fn resolve_user_ids(&self, email: &str) -> Vec<u64> {
        DirectoryClient::resolve_user_ids(self, email)
    }

    fn public_key(&self, uid: u64) -> Option<String> {
        DirectoryClient::public_key(self, uid)
    }
}

impl KeyImport for Keyring {
    fn import(&self, key_material: &str) -> anyhow::Result<ImportOutcome> {
        Keyring::import(self, key_material)
    }
}
