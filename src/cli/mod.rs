//! CLI argument parsing and command dispatch
//!
//! The binary is a thin wrapper: it parses [Cli], initialises logging and
//! calls [Cli::execute]. Everything else lives here so it can be exercised
//! from tests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::config::{self, Config};
use crate::domain::{latest_version, Suggestions, VersionToken};
use crate::git::{Git2Repository, SshCredentials};
use crate::ui;
use crate::workflow::{ReleasePlan, ReleaseWorkflow};

#[derive(Parser, Debug)]
#[command(
    name = "git-release",
    version,
    about = "Cut release branches and publish version tags"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a release: `2` cuts release/v2 from develop, `2.1` tags release/v2
    #[command(visible_aliases = ["p", "worship"])]
    Publish(PublishArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PublishArgs {
    /// Version to publish (2, v2, 2.0, v2.0, 2.1, v2.1); prompts when omitted
    #[arg(value_name = "VERSION")]
    pub raw_version: Option<String>,

    /// Repository path
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Private key file used for SSH remotes [default: ~/.ssh/id_rsa]
    #[arg(short = 'f', long)]
    pub keyfile: Option<PathBuf>,

    /// Passphrase of the private key
    #[arg(long)]
    pub keyfile_password: Option<String>,

    /// Custom configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remote to pull from and push to (overrides the configuration)
    #[arg(long)]
    pub remote: Option<String>,

    /// Print the release steps without touching the repository
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Log level selected by the `-v` count
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Command::Publish(args) => publish(args),
        }
    }
}

impl PublishArgs {
    /// Key file from the command line, then the configuration, then `~/.ssh/id_rsa`
    pub fn resolve_key_file(&self, config: &Config) -> Option<PathBuf> {
        self.keyfile
            .clone()
            .or_else(|| config.auth.key_file.clone())
            .or_else(SshCredentials::default_key_file)
    }

    /// Remote from the command line, falling back to the configuration
    pub fn resolve_remote(&self, config: &Config) -> String {
        self.remote
            .clone()
            .unwrap_or_else(|| config.remote.name.clone())
    }
}

fn publish(args: PublishArgs) -> Result<()> {
    let config = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let remote = args.resolve_remote(&config);

    let mut repo = Git2Repository::open(&args.path)
        .with_context(|| format!("Failed to open repository at {}", args.path.display()))?
        .with_remote(&remote);

    if !args.dry_run {
        let key_file = args
            .resolve_key_file(&config)
            .context("No private key file given and no home directory to look in")?;
        let credentials = SshCredentials::new(key_file, args.keyfile_password.clone());
        credentials.validate()?;
        repo = repo.with_credentials(credentials);
    }

    let version = match args.raw_version.as_deref() {
        Some(raw) => VersionToken::parse(raw.trim())?,
        None => {
            let latest = latest_version(&repo).context("Failed to resolve the latest release")?;
            ui::prompt_version(&Suggestions::from_latest(latest))?
        }
    };

    let policy = config.policy();
    let plan = ReleasePlan::new(&policy, version);
    ui::display_plan(&plan, &remote, args.dry_run);
    if args.dry_run {
        ui::display_status("Dry run, repository left untouched");
        return Ok(());
    }

    let outcome = ReleaseWorkflow::new(&repo, policy).run(version)?;
    ui::display_outcome(&outcome);
    Ok(())
}
