//! # acl-check
//!
//! Command-line front end for the ACL checker.
//!
//! ```text
//! acl-check --groups-file groups.json bob beatles everyone@usso
//! ```
//!
//! Prints `allow` or `deny` and exits with 0 (allow), 1 (deny) or 2 (error).
//!
//! ## Configuration
//!
//! Settings come from `--config <file>` (JSON) or, failing that, from the
//! `ACLCHECK_*` environment variables. `RUST_LOG` overrides the log level.

use aclcheck_authz::{
    identity::USERNAME_ATTR, AclUser, CheckerConfig, CheckerIdentityClient, IdentityClient,
    PermChecker, StaticGroupLookup, StripDomain,
};
use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser, ValueHint};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Check whether a user is admitted by an ACL
#[derive(Debug, Parser)]
#[command(name = "acl-check", version, about, long_about = None)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Path to a JSON configuration file
    #[arg(short, long, env = "ACLCHECK_CONFIG", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// JSON file mapping usernames to their groups
    #[arg(short, long, env = "ACLCHECK_GROUPS_FILE", value_hint = ValueHint::FilePath)]
    groups_file: Option<PathBuf>,

    /// Group cache TTL in seconds
    #[arg(long)]
    ttl: Option<u64>,

    /// Strip this domain from user and group names
    #[arg(long)]
    strip_domain: Option<String>,

    /// Print the user's groups instead of checking an ACL
    #[arg(long)]
    show_groups: bool,

    /// User to check
    username: String,

    /// ACL entries (user names, group names or everyone wildcards)
    acl: Vec<String>,
}

/// Application exit codes
#[repr(u8)]
enum Exit {
    Allow = 0,
    Deny = 1,
    Error = 2,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => Exit::Allow.into(),
        Ok(false) => Exit::Deny.into(),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("acl-check: {:#}", e);
            Exit::Error.into()
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose >= 2))
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<CheckerConfig> {
    let mut config = match &cli.config {
        Some(path) => CheckerConfig::from_json_file(path)
            .with_context(|| format!("cannot load config from {}", path.display()))?,
        None => CheckerConfig::from_env()?,
    };
    if let Some(ttl) = cli.ttl {
        config.cache_ttl_secs = ttl;
    }
    if let Some(domain) = &cli.strip_domain {
        config.strip_domain = Some(domain.clone());
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;
    info!("acl-check v{}", aclcheck_authz::VERSION);
    debug!(?config, "loaded configuration");

    let lookup = match &cli.groups_file {
        Some(path) => StaticGroupLookup::from_json_file(path)
            .with_context(|| format!("cannot load groups from {}", path.display()))?,
        None => StaticGroupLookup::new(),
    };
    info!(users = lookup.user_count(), "group directory loaded");

    let checker = PermChecker::from_config(lookup, &config)?;

    let Some(domain) = config.strip_domain.as_deref() else {
        if cli.show_groups {
            print_groups(&checker.groups(&cli.username)?);
            return Ok(true);
        }
        let allowed = checker.allow(&cli.username, &cli.acl)?;
        print_decision(allowed);
        return Ok(allowed);
    };

    let client = StripDomain::new(CheckerIdentityClient::new(checker), domain);
    let attrs = HashMap::from([(USERNAME_ATTR.to_string(), cli.username.clone())]);
    let identity = client.declared_identity(&attrs)?;
    let user = identity
        .as_acl_user()
        .ok_or_else(|| anyhow!("identity {:?} does not support ACL queries", identity.id()))?;
    info!(username = %user.username()?, domain, "checking as domain-stripped user");

    if cli.show_groups {
        print_groups(&user.groups()?);
        return Ok(true);
    }
    let allowed = user.allow(&cli.acl)?;
    print_decision(allowed);
    Ok(allowed)
}

fn print_decision(allowed: bool) {
    println!("{}", if allowed { "allow" } else { "deny" });
}

fn print_groups(groups: &[String]) {
    for group in groups {
        println!("{}", group);
    }
}
