mod config;
mod github;
mod locations;
mod pages;
mod roster;
mod site;
mod stats;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Command, SiteArgs};
use github::GithubClient;
use pages::ProfilePage;
use roster::{Contributor, Roster};
use site::{Site, SiteError};
use std::time::Duration;

const STATS_POLL_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();
    let args = &cli.site;

    let roster_path = args.resolve(&args.roster);
    let fellows = roster::load_roster(&roster_path)?;
    let mut site = Site::load(&args.source)?;

    // Profiles are always registered so the leaderboard can link to them.
    let profiles = pages::materialize(&fellows)?;
    if matches!(cli.command, Command::Fellows | Command::Build) {
        write_profiles(args, &profiles)?;
    }
    site.register_profiles(profiles);

    if matches!(cli.command, Command::Stats | Command::Build) {
        generate_stats(args, fellows, &mut site).await?;
    }

    let data_out = args.resolve(&args.data_out);
    let written = site.emit(&data_out)?;
    if written > 0 {
        println!("Wrote {written} data file(s) to {}", data_out.display());
    }

    Ok(())
}

fn write_profiles(args: &SiteArgs, profiles: &[ProfilePage]) -> Result<()> {
    let dir = args.resolve(&args.fellows_dir);
    let count = pages::write_pages(profiles, &dir)?;

    println!("Generated {count} profile page(s) in {}", dir.display());
    Ok(())
}

async fn generate_stats(
    args: &SiteArgs,
    fellows: Vec<Contributor>,
    site: &mut Site,
) -> Result<()> {
    let directory = locations::directory(&fellows);
    let directory =
        serde_json::to_value(directory).context("Failed to serialize fellow locations")?;
    site.set_data(locations::SITE_DATA_KEY, directory);

    let roster = Roster::new(fellows)?;
    if roster.is_empty() {
        log::warn!("The roster is empty; every count will be zero");
    }
    let projects = roster::load_projects(&args.resolve(&args.projects))?;

    // Fail before any request if the leaderboard has nowhere to go.
    if site.find_page(&args.leaderboard_page).is_none() {
        let page = args.leaderboard_page.clone();
        return Err(SiteError::MissingPage(page).into());
    }

    let client = GithubClient::new(&args.api_url, args.token.clone())?
        .with_stats_polls(args.stats_polls, STATS_POLL_DELAY);
    log::info!(
        "Collecting stats for {} fellows across {} projects",
        roster.len(),
        projects.len()
    );

    let mut leaderboard = stats::collect(&client, &roster, &projects)
        .await
        .context("Failed to collect contribution statistics")?;
    leaderboard.link_profiles(site);
    leaderboard.attach_to(site, &args.leaderboard_page)?;

    println!(
        "Leaderboard: {} fellows, {} projects, {} commits, {} merged pull requests",
        leaderboard.fellows.len(),
        leaderboard.projects.len(),
        leaderboard.commit_total(),
        leaderboard.merged_total()
    );
    Ok(())
}
