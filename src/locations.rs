use crate::roster::Contributor;
use serde::Serialize;

/// Site data key the map page reads.
pub const SITE_DATA_KEY: &str = "fellows_information";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FellowLocation {
    pub name: String,
    pub location: String,
    pub description: String,
}

/// Where every fellow is, with a short blurb. Falls back to `about` for
/// roster entries without a `description`.
pub fn directory(fellows: &[Contributor]) -> Vec<FellowLocation> {
    fellows
        .iter()
        .map(|f| FellowLocation {
            name: f.display_name.clone(),
            location: f.location.clone(),
            description: f.description.clone().unwrap_or_else(|| f.about.clone()),
        })
        .collect()
}
