//! stats.rs
//!
//! The contribution leaderboard. For every project the commit and merged pull
//! request data is fetched and joined against the roster into a [`RepoTally`];
//! once all projects are in, the tallies are reduced into a [`Leaderboard`]
//! in a single pass. Nothing is accumulated into the roster itself, so a run
//! always starts from zero.
//!
//! Only fellows count: authors missing from the roster are dropped, and the
//! per-project totals are the sum over fellows, not over everyone.

use crate::github::{ContributorCommits, MergedPull, StatsError, StatsSource};
use crate::pages::slugify;
use crate::roster::{Contributor, Project, Roster};
use crate::site::{Site, SiteError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one repository contributed, indexed by roster position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTally {
    pub commits: Vec<u64>,
    pub merged: Vec<u64>,
    pub commit_total: u64,
    pub merged_total: u64,
}

impl RepoTally {
    pub fn new(roster: &Roster, commits: &[ContributorCommits], pulls: &[MergedPull]) -> Self {
        let mut tally = Self {
            commits: vec![0; roster.len()],
            merged: vec![0; roster.len()],
            commit_total: 0,
            merged_total: 0,
        };

        for entry in commits {
            let Some(idx) = entry.login.as_deref().and_then(|l| roster.lookup(l)) else {
                log::debug!("Non-fellow {:?}: {} commits", entry.login, entry.total);
                continue;
            };
            tally.commits[idx] += entry.total;
            tally.commit_total += entry.total;
        }

        for pull in pulls {
            let Some(idx) = pull.author.as_deref().and_then(|l| roster.lookup(l)) else {
                log::debug!("Non-fellow {:?}: merged pull request", pull.author);
                continue;
            };
            tally.merged[idx] += 1;
            tally.merged_total += 1;
        }

        tally
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorStats {
    #[serde(flatten)]
    pub fellow: Contributor,
    /// Slug of the fellow's profile page, when one was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub commits: u64,
    pub pulls_merged: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    #[serde(flatten)]
    pub project: Project,
    pub commits: u64,
    pub pulls_merged: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub generated_at: DateTime<Utc>,
    pub fellows: Vec<ContributorStats>,
    pub projects: Vec<ProjectStats>,
}

impl Leaderboard {
    /// Sums the per-repository tallies. `tallies[i]` belongs to `projects[i]`.
    pub fn reduce(roster: &Roster, projects: &[Project], tallies: &[RepoTally]) -> Self {
        debug_assert_eq!(projects.len(), tallies.len(), "one tally per project");

        let mut fellows: Vec<ContributorStats> = roster
            .contributors()
            .iter()
            .map(|fellow| ContributorStats {
                fellow: fellow.clone(),
                url: None,
                commits: 0,
                pulls_merged: 0,
            })
            .collect();

        for tally in tallies {
            let counts = tally.commits.iter().zip(&tally.merged);
            for (stats, (commits, merged)) in fellows.iter_mut().zip(counts) {
                stats.commits += commits;
                stats.pulls_merged += merged;
            }
        }

        let projects = projects
            .iter()
            .zip(tallies)
            .map(|(project, tally)| ProjectStats {
                project: project.clone(),
                commits: tally.commit_total,
                pulls_merged: tally.merged_total,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            fellows,
            projects,
        }
    }

    pub fn commit_total(&self) -> u64 {
        self.projects.iter().map(|p| p.commits).sum()
    }

    pub fn merged_total(&self) -> u64 {
        self.projects.iter().map(|p| p.pulls_merged).sum()
    }

    /// Points every fellow at their registered profile page.
    pub fn link_profiles(&mut self, site: &Site) {
        for stats in &mut self.fellows {
            let slug = slugify(&stats.fellow.display_name);
            stats.url = site.find_profile(&slug).map(|p| p.slug.clone());
        }
    }

    /// Hands the leaderboard to the named page's template.
    pub fn attach_to(&self, site: &mut Site, page: &str) -> Result<(), SiteError> {
        site.attach(page, "fellows", &self.fellows)?;
        site.attach(page, "projects", &self.projects)?;
        site.attach(page, "generated_at", &self.generated_at)
    }
}

/// Fetches every project in order and builds the leaderboard. The first
/// failing request aborts the whole run.
pub async fn collect<S: StatsSource>(
    source: &S,
    roster: &Roster,
    projects: &[Project],
) -> Result<Leaderboard, StatsError> {
    let mut tallies = Vec::with_capacity(projects.len());

    for project in projects {
        let repo = &project.repo;
        log::info!("Fetching contribution stats for {repo}");

        let commits = source.contributor_commits(repo).await?;
        let pulls = source.merged_pulls(repo).await?;
        let tally = RepoTally::new(roster, &commits, &pulls);

        log::debug!(
            "{repo}: {} commits and {} merged pull requests by fellows",
            tally.commit_total,
            tally.merged_total
        );
        tallies.push(tally);
    }

    Ok(Leaderboard::reduce(roster, projects, &tallies))
}
