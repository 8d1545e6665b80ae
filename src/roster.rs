//! roster.rs
//!
//! Loading of the two YAML data files that drive the site: the roster of pod
//! fellows (`_data/fellows.yml`) and the list of projects they work on
//! (`_data/projects.yml`).
//!
//! The roster doubles as the join table for contribution statistics. Every
//! fellow has a canonical login (the `login` key, or the display name for
//! older roster files that predate it) which is matched case-insensitively,
//! since GitHub itself treats logins that way.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("roster entry #{index} has an empty display name")]
    EmptyDisplayName { index: usize },

    #[error("fellows {first:?} and {second:?} would share the page slug {slug:?}")]
    SlugCollision {
        slug: String,
        first: String,
        second: String,
    },

    #[error("login {login:?} appears more than once in the roster")]
    DuplicateLogin { login: String },
}

/// One fellow, as listed in the roster file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contributor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub languages: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub hobbies: Vec<String>,
    #[serde(default, rename = "img", alias = "image")]
    pub image_ref: String,
}

impl Contributor {
    /// Key used to match this fellow against GitHub authors. A blank
    /// `login` counts as missing.
    pub fn join_key(&self) -> &str {
        self.login
            .as_deref()
            .filter(|login| !login.trim().is_empty())
            .unwrap_or(&self.display_name)
    }
}

/// Older roster files spell list fields as a single comma separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(OneOrMany::Many(items)) => items,
    })
}

/// Lowercases a login so lookups ignore case.
pub fn canonical_login(login: &str) -> String {
    login.trim().to_ascii_lowercase()
}

/// The validated roster with a login index for joining.
#[derive(Debug, Clone)]
pub struct Roster {
    contributors: Vec<Contributor>,
    by_login: HashMap<String, usize>,
}

impl Roster {
    pub fn new(contributors: Vec<Contributor>) -> Result<Self, RosterError> {
        let mut by_login = HashMap::with_capacity(contributors.len());

        for (index, contributor) in contributors.iter().enumerate() {
            let key = canonical_login(contributor.join_key());
            if key.is_empty() {
                return Err(RosterError::EmptyDisplayName { index });
            }
            if by_login.insert(key.clone(), index).is_some() {
                return Err(RosterError::DuplicateLogin { login: key });
            }
        }

        Ok(Self {
            contributors,
            by_login,
        })
    }

    /// Position of the fellow with this GitHub login, if any.
    pub fn lookup(&self, login: &str) -> Option<usize> {
        self.by_login.get(&canonical_login(login)).copied()
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }
}

/// A GitHub repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A project from the projects file. Keys other than the repository are kept
/// untouched so the leaderboard template can still use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProject")]
pub struct Project {
    pub repo: Repository,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProject {
    Nested {
        repo: Repository,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Flat {
        owner: String,
        name: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<RawProject> for Project {
    fn from(raw: RawProject) -> Self {
        match raw {
            RawProject::Nested { repo, extra } => Self { repo, extra },
            RawProject::Flat { owner, name, extra } => Self {
                repo: Repository { owner, name },
                extra,
            },
        }
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RosterError> {
    let text = fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml(&text).map_err(|source| RosterError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// An empty data file means an empty list.
fn parse_yaml<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, serde_yaml::Error> {
    let items: Option<Vec<T>> = serde_yaml::from_str(text)?;
    Ok(items.unwrap_or_default())
}

pub fn load_roster(path: &Path) -> Result<Vec<Contributor>, RosterError> {
    let fellows: Vec<Contributor> = read_yaml(path)?;
    log::debug!("Loaded {} fellows from {}", fellows.len(), path.display());
    Ok(fellows)
}

pub fn load_projects(path: &Path) -> Result<Vec<Project>, RosterError> {
    let projects: Vec<Project> = read_yaml(path)?;
    log::debug!("Loaded {} projects from {}", projects.len(), path.display());
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fellow(name: &str, login: Option<&str>) -> Contributor {
        Contributor {
            login: login.map(str::to_owned),
            display_name: name.to_owned(),
            ..Contributor::default()
        }
    }

    #[test]
    fn parses_roster_with_legacy_list_strings() {
        let yaml = r#"
- name: Jay Gala
  login: jaygala
  title: Fellow
  location: Mumbai, India
  languages: Rust, Python
  hobbies:
    - chess
  img: /img/jay.png
- name: Ada Lovelace
"#;
        let roster: Vec<Contributor> = parse_yaml(yaml).unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].login.as_deref(), Some("jaygala"));
        assert_eq!(roster[0].languages, vec!["Rust", "Python"]);
        assert_eq!(roster[0].hobbies, vec!["chess"]);
        assert_eq!(roster[0].image_ref, "/img/jay.png");
        assert_eq!(roster[1].join_key(), "Ada Lovelace");
        assert!(roster[1].languages.is_empty());
    }

    #[test]
    fn parses_nested_and_flat_projects() {
        let yaml = r#"
- title: Docs site
  repo:
    owner: MLH
    name: site
- owner: MLH
  name: api
  description: Public API
"#;
        let projects: Vec<Project> = parse_yaml(yaml).unwrap();

        assert_eq!(projects[0].repo.to_string(), "MLH/site");
        assert_eq!(projects[0].extra["title"], "Docs site");
        assert_eq!(projects[1].repo.to_string(), "MLH/api");
        assert_eq!(projects[1].extra["description"], "Public API");
        assert!(!projects[1].extra.contains_key("owner"));
    }

    #[test]
    fn empty_file_is_an_empty_list() {
        let projects: Vec<Project> = parse_yaml("").unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn lookup_ignores_case() {
        let fellows = vec![fellow("Alice", Some("Alice-Dev")), fellow("bob", None)];
        let roster = Roster::new(fellows).unwrap();

        assert_eq!(roster.lookup("alice-dev"), Some(0));
        assert_eq!(roster.lookup("ALICE-DEV"), Some(0));
        assert_eq!(roster.lookup("Bob"), Some(1));
        assert_eq!(roster.lookup("carol"), None);
    }

    #[test]
    fn rejects_duplicate_logins() {
        let fellows = vec![fellow("A", Some("alice")), fellow("B", Some("ALICE"))];
        let err = Roster::new(fellows).unwrap_err();
        let RosterError::DuplicateLogin { login } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(login, "alice");
    }

    #[test]
    fn rejects_empty_join_key() {
        let err = Roster::new(vec![fellow("  ", None)]).unwrap_err();
        assert!(matches!(err, RosterError::EmptyDisplayName { index: 0 }));
    }

    #[test]
    fn blank_login_falls_back_to_display_name() {
        let fellows: Vec<Contributor> = parse_yaml("- name: Jay Gala\n  login: \"\"\n").unwrap();
        let roster = Roster::new(fellows).unwrap();

        assert_eq!(roster.contributors()[0].join_key(), "Jay Gala");
        assert_eq!(roster.lookup("jay gala"), Some(0));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_roster(&dir.path().join("fellows.yml")).unwrap_err();
        assert!(matches!(err, RosterError::Read { .. }));
    }
}
