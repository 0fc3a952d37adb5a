//! The build command

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::Cli;
use avforge::builder::BuildContext;
use avforge::core::catalog::{schedule_for, Profile};
use avforge::core::package::Channel;
use avforge::core::platform::PlatformFacts;
use avforge::core::schedule::{Prefixes, Schedule};
use avforge::ops::{artifact_path, preflight, BuildOrchestrator, RunOutcome};
use avforge::sources::HttpTransport;
use avforge::util::config::{Config, CONFIG_FILE};
use avforge::util::fs::absolute;
use avforge::util::process::SystemRunner;

/// What `--plan` prints.
#[derive(Serialize)]
struct Plan<'a> {
    profile: Profile,
    channel: Channel,
    platform: &'a PlatformFacts,
    destination: &'a Path,
    artifact: &'a Path,
    schedule: &'a Schedule,
}

pub fn execute(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;

    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_or_default(&cwd.join(CONFIG_FILE)),
    };

    let platform = PlatformFacts::detect();
    let channel = Channel::from_community_flag(cli.community);
    let dest = absolute(&cli.destination)?;

    let schedule = schedule_for(cli.profile, &platform, channel, &config)?.select(channel);

    let output_dir = config.output_dir(platform.os, &cwd, |key| std::env::var(key).ok());
    let artifact = artifact_path(&output_dir, &platform);

    if cli.plan {
        let plan = Plan {
            profile: cli.profile,
            channel,
            platform: &platform,
            destination: &dest,
            artifact: &artifact,
            schedule: &schedule,
        };
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if artifact.exists() {
        tracing::info!("{} already exists, nothing to do", artifact.display());
        return Ok(());
    }

    tracing::info!(
        "Building {} profile for {} ({} channel, {} packages)",
        cli.profile,
        platform.tag(),
        channel,
        schedule.len()
    );

    preflight(&schedule)?;

    let ctx = BuildContext::new(
        Prefixes::for_destination(&dest),
        cwd.join(&config.paths.build_dir),
        platform,
    );
    let transport = HttpTransport::new()?;
    let runner = SystemRunner;

    let mut orchestrator = BuildOrchestrator::new(
        ctx,
        &runner,
        &transport,
        cwd.join(&config.paths.source_dir),
        &artifact,
    )
    .fetch_jobs(config.fetch.jobs)
    .progress(std::io::stderr().is_terminal());

    match orchestrator.run(&schedule)? {
        RunOutcome::UpToDate(path) => {
            tracing::info!("{} already exists, nothing to do", path.display());
        }
        RunOutcome::Built(path) => {
            tracing::info!("Built {}", path.display());
        }
    }

    Ok(())
}
