//! site.rs
//!
//! An explicit stand-in for the site object a page generator works against:
//! the pages found in the site source, the generated profile pages, and
//! global site data. Generators receive it by reference instead of reaching
//! for shared state.

use crate::pages::ProfilePage;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PAGE_EXTENSIONS: [&str; 2] = ["html", "md"];

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("page {0:?} not found in the site source")]
    MissingPage(String),

    #[error("failed to scan site source {}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {key:?} for page {page:?}")]
    Serialize {
        page: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A source page and the data generators attached to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub name: String,
    pub data: Map<String, Value>,
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Map::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Site {
    pages: Vec<Page>,
    profiles: Vec<ProfilePage>,
    data: Map<String, Value>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every top-level `.html`/`.md` file of `source` as a page.
    pub fn load(source: &Path) -> Result<Self, SiteError> {
        let scan_err = |e| SiteError::Scan {
            path: source.to_path_buf(),
            source: e,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(source).map_err(scan_err)? {
            let entry = entry.map_err(scan_err)?;
            let path = entry.path();
            let is_page = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext));
            if is_page {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        log::debug!("Found {} pages in {}", names.len(), source.display());
        let mut site = Self::new();
        for name in names {
            site.register(Page::new(name));
        }
        Ok(site)
    }

    pub fn register(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn find_page(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.name == name)
    }

    /// Like [`Site::find_page`], but a missing page is an error.
    pub fn require_page(&mut self, name: &str) -> Result<&mut Page, SiteError> {
        self.pages
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| SiteError::MissingPage(name.to_owned()))
    }

    /// Sets `key` on the named page's data.
    pub fn attach<T: serde::Serialize>(
        &mut self,
        page: &str,
        key: &str,
        value: &T,
    ) -> Result<(), SiteError> {
        let value = serde_json::to_value(value).map_err(|source| SiteError::Serialize {
            page: page.to_owned(),
            key: key.to_owned(),
            source,
        })?;
        let page = self.require_page(page)?;
        let _ = page.data.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn register_profiles(&mut self, profiles: Vec<ProfilePage>) {
        self.profiles.extend(profiles);
    }

    pub fn find_profile(&self, slug: &str) -> Option<&ProfilePage> {
        self.profiles.iter().find(|p| p.slug == slug)
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        let _ = self.data.insert(key.into(), value);
    }

    /// Writes the data attached to pages, and the global site data, as JSON
    /// files in `dest`: `<page name>.json` and `<key>.json` respectively.
    pub fn emit(&self, dest: &Path) -> Result<usize> {
        let mut outputs: Vec<(String, Value)> = self
            .pages
            .iter()
            .filter(|p| !p.data.is_empty())
            .map(|p| (format!("{}.json", p.name), p.data.clone().into()))
            .collect();
        for (key, value) in &self.data {
            outputs.push((format!("{key}.json"), value.clone()));
        }

        if outputs.is_empty() {
            return Ok(0);
        }

        fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
        for (file_name, value) in &outputs {
            let path = dest.join(file_name);
            let text = serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {file_name}"))?;
            fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            log::debug!("Wrote {}", path.display());
        }

        Ok(outputs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::materialize;
    use crate::roster::Contributor;
    use serde_json::json;

    #[test]
    fn load_registers_top_level_pages() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stats.html"), "---\nlayout: stats\n---\n").unwrap();
        fs::write(dir.path().join("index.md"), "# Hello").unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();
        fs::create_dir(dir.path().join("nested.html")).unwrap();

        let site = Site::load(dir.path()).unwrap();
        let names: Vec<_> = site.pages.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["index.md", "stats.html"]);
        assert!(site.find_page("style.css").is_none());
    }

    #[test]
    fn attach_to_missing_page_fails() {
        let mut site = Site::new();
        site.register(Page::new("index.md"));

        let page = "stats.html";
        let err = site.attach(page, "fellows", &json!([])).unwrap_err();
        assert!(matches!(err, SiteError::MissingPage(name) if name == page));
    }

    #[test]
    fn attach_sets_page_data() {
        let mut site = Site::new();
        site.register(Page::new("stats.html"));

        let projects = vec!["a", "b"];
        site.attach("stats.html", "projects", &projects).unwrap();

        let page = site.find_page("stats.html").unwrap();
        assert_eq!(page.data["projects"], json!(["a", "b"]));
    }

    #[test]
    fn profiles_are_found_by_slug() {
        let fellow = Contributor {
            display_name: "Jay Gala".to_owned(),
            ..Contributor::default()
        };
        let mut site = Site::new();
        site.register_profiles(materialize(&[fellow]).unwrap());

        assert!(site.find_profile("jay-gala").is_some());
        assert!(site.find_profile("ada").is_none());
    }

    #[test]
    fn emit_writes_page_and_site_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = Site::new();
        site.register(Page::new("index.md"));
        site.register(Page::new("stats.html"));
        let fellows = json!([{ "name": "Alice" }]);
        site.attach("stats.html", "fellows", &fellows).unwrap();
        site.set_data("fellows_information", json!([]));

        let written = site.emit(dir.path()).unwrap();

        assert_eq!(written, 2);
        let text = fs::read_to_string(dir.path().join("stats.html.json")).unwrap();
        let stats: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(stats["fellows"][0]["name"], "Alice");
        assert!(dir.path().join("fellows_information.json").exists());
        assert!(!dir.path().join("index.md.json").exists());
    }
}
