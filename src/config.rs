use crate::github::DEFAULT_API_URL;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Generates fellow profile pages and the contribution leaderboard.
#[derive(Debug, Parser)]
#[command(name = "podsite", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub site: SiteArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Write one profile page per fellow
    Fellows,
    /// Fetch contribution statistics and attach them to the leaderboard page
    Stats,
    /// Profile pages, then statistics
    Build,
}

#[derive(Debug, Clone, Args)]
pub struct SiteArgs {
    /// Site source directory; relative paths below resolve against it
    #[arg(long, global = true, default_value = ".")]
    pub source: PathBuf,

    /// Roster of fellows
    #[arg(long, global = true, default_value = "_data/fellows.yml")]
    pub roster: PathBuf,

    /// Projects whose repositories are counted
    #[arg(long, global = true, default_value = "_data/projects.yml")]
    pub projects: PathBuf,

    /// Where profile pages are written
    #[arg(long, global = true, default_value = "_fellows")]
    pub fellows_dir: PathBuf,

    /// Where data attached to pages is written as JSON
    #[arg(long, global = true, default_value = "_site/data")]
    pub data_out: PathBuf,

    /// Name of the page that renders the leaderboard
    #[arg(long, global = true, default_value = "stats.html")]
    pub leaderboard_page: String,

    /// GitHub REST API root
    #[arg(
        long,
        global = true,
        env = "GITHUB_API_URL",
        default_value = DEFAULT_API_URL
    )]
    pub api_url: String,

    /// GitHub token; requests are anonymous without it
    #[arg(long, global = true, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Times to re-ask GitHub while it is still computing repository statistics
    #[arg(long, global = true, default_value_t = 3)]
    pub stats_polls: usize,
}

impl SiteArgs {
    /// Resolves `path` against the site source unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.source.join(path)
        }
    }
}
