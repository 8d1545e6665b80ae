//! pages.rs
//!
//! Builds one profile page per fellow. Each page is a Markdown file whose
//! YAML front matter selects the `profile` layout and carries the fields the
//! layout renders; the body is empty.

use crate::roster::{Contributor, RosterError};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PROFILE_LAYOUT: &str = "profile";

/// Turns a display name into the page slug: lowercase, spaces to hyphens,
/// periods dropped.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-").replace('.', "")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePage {
    #[serde(skip)]
    pub slug: String,
    pub layout: &'static str,
    pub title: String,
    pub location: String,
    pub university: String,
    pub about: String,
    pub languages: Vec<String>,
    pub hobbies: Vec<String>,
    pub img: String,
}

impl ProfilePage {
    fn new(slug: String, fellow: &Contributor) -> Self {
        Self {
            slug,
            layout: PROFILE_LAYOUT,
            title: fellow.title.clone(),
            location: fellow.location.clone(),
            university: fellow.university.clone(),
            about: fellow.about.clone(),
            languages: fellow.languages.clone(),
            hobbies: fellow.hobbies.clone(),
            img: fellow.image_ref.clone(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.md", self.slug)
    }

    /// The page as a front-matter-only Markdown document.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        let front_matter = serde_yaml::to_string(self)?;
        Ok(format!("---\n{front_matter}---\n"))
    }
}

/// One page per fellow, in roster order.
pub fn materialize(fellows: &[Contributor]) -> Result<Vec<ProfilePage>, RosterError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(fellows.len());
    let mut pages = Vec::with_capacity(fellows.len());

    for (index, fellow) in fellows.iter().enumerate() {
        if fellow.display_name.trim().is_empty() {
            return Err(RosterError::EmptyDisplayName { index });
        }

        let slug = slugify(&fellow.display_name);
        if let Some(first) = seen.insert(slug.clone(), &fellow.display_name) {
            return Err(RosterError::SlugCollision {
                slug,
                first: first.to_owned(),
                second: fellow.display_name.clone(),
            });
        }

        pages.push(ProfilePage::new(slug, fellow));
    }

    Ok(pages)
}

/// Writes every page into `dir`, creating it if needed.
pub fn write_pages(pages: &[ProfilePage], dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    for page in pages {
        let path = dir.join(page.file_name());
        let contents = page
            .render()
            .with_context(|| format!("Failed to render {}", page.slug))?;
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
    }

    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fellow(name: &str) -> Contributor {
        Contributor {
            display_name: name.to_owned(),
            title: "Fellow".to_owned(),
            languages: vec!["Rust".to_owned()],
            image_ref: "/img/me.png".to_owned(),
            ..Contributor::default()
        }
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Jay Gala"), "jay-gala");
        assert_eq!(slugify("A. B. Smith"), "a-b-smith");
        assert_eq!(slugify("solo"), "solo");
        assert_eq!(slugify("Jay Gala"), slugify("Jay Gala"));
    }

    #[test]
    fn materialize_preserves_order_and_fields() {
        let pages = materialize(&[fellow("Jay Gala"), fellow("A. B. Smith")]).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].slug, "jay-gala");
        assert_eq!(pages[1].slug, "a-b-smith");
        assert_eq!(pages[0].layout, "profile");
        assert_eq!(pages[0].title, "Fellow");
        assert_eq!(pages[0].img, "/img/me.png");
        assert_eq!(pages[0].file_name(), "jay-gala.md");
    }

    #[test]
    fn materialize_rejects_empty_names() {
        let err = materialize(&[fellow("Jay Gala"), fellow("   ")]).unwrap_err();
        assert!(matches!(err, RosterError::EmptyDisplayName { index: 1 }));
    }

    #[test]
    fn materialize_rejects_slug_collisions() {
        let err = materialize(&[fellow("Jay Gala"), fellow("jay gala.")]).unwrap_err();
        match err {
            RosterError::SlugCollision { slug, first, second } => {
                assert_eq!(slug, "jay-gala");
                assert_eq!(first, "Jay Gala");
                assert_eq!(second, "jay gala.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn render_emits_front_matter_only() {
        let pages = materialize(&[fellow("Jay Gala")]).unwrap();
        let text = pages[0].render().unwrap();

        assert!(text.starts_with("---\nlayout: profile\n"));
        assert!(text.ends_with("---\n"));
        assert!(text.contains("title: Fellow\n"));
        assert!(text.contains("- Rust\n"));
        assert!(!text.contains("slug"));
    }

    #[test]
    fn write_pages_creates_one_file_per_fellow() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("_fellows");
        let pages = materialize(&[fellow("Jay Gala"), fellow("Ada Lovelace")]).unwrap();

        assert_eq!(write_pages(&pages, &out).unwrap(), 2);

        let jay = fs::read_to_string(out.join("jay-gala.md")).unwrap();
        assert!(jay.contains("layout: profile"));
        assert!(out.join("ada-lovelace.md").exists());
    }
}
