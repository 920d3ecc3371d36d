use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vc_core::TrustResolver;
use vc_directory::DirectoryClient;
use vc_git::Repository;
use vc_gpg::Keyring;

/// Check out the newest GPG-verified commit from a remote repository.
///
/// Intended as the first step of a deployment pipeline: the history of the
/// remote is deepened progressively, committer identities are resolved to
/// public keys through the user directory, and the newest commit whose
/// signature verifies is checked out. Nothing is checked out otherwise.
#[derive(Parser)]
#[command(name = "vc-checkout", version)]
struct Cli {
    /// Path to an existing checkout or a directory to create
    #[arg(short = 't', long)]
    target_dir: PathBuf,

    /// Remote URL of the git repository
    #[arg(short = 'u', long)]
    url: String,

    /// Branch to inspect instead of the remote's default branch
    #[arg(long)]
    branch: Option<String>,

    /// Substring a committer's name or email must contain to be considered
    #[arg(long, default_value = "")]
    committer_filter: String,

    /// Base URL of the user directory API
    #[arg(
        long,
        env = "USER_API_URL",
        default_value = "https://gitlab.com/api/v4/users"
    )]
    user_api_url: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let directory = DirectoryClient::from_env(cli.user_api_url.as_str())?;
    let repository = Repository::init_or_open(&cli.target_dir, Some(cli.url.as_str()))?
        .with_committer_filter(cli.committer_filter);
    let resolver =
        TrustResolver::new(repository, directory, Keyring::new()).with_branch(cli.branch);

    let commit = resolver.resolve()?;
    info!(oid = %commit.oid, "verified commit checked out");
    Ok(())
}
