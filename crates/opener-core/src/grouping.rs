use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::catalog::ProjectEntry;
use crate::collections::Collection;
use crate::recency::is_recent_project;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupingMode {
    #[default]
    Collection,
    Recency,
    Flat,
}

impl GroupingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Recency => "recency",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "collection" => Ok(Self::Collection),
            "recency" => Ok(Self::Recency),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown grouping mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSection<'a> {
    pub title: String,
    pub entries: Vec<&'a ProjectEntry>,
    /// Rule-derived section, as opposed to one backed by a manual collection.
    pub is_auto: bool,
}

impl<'a> ProjectSection<'a> {
    fn auto(title: &str, entries: Vec<&'a ProjectEntry>) -> Self {
        Self {
            title: title.to_string(),
            entries,
            is_auto: true,
        }
    }
}

/// Split already filtered entries into display sections. Empty sections are
/// dropped and, in collection mode, each entry lands in exactly one section.
pub fn group_entries<'a>(
    entries: &'a [ProjectEntry],
    mode: GroupingMode,
    collections: &[Collection],
    now: i64,
) -> Vec<ProjectSection<'a>> {
    let recent = |entry: &&ProjectEntry| is_recent_project(entry.project.last_opened, now);

    let sections = match mode {
        GroupingMode::Flat => vec![ProjectSection::auto("All Projects", entries.iter().collect())],
        GroupingMode::Recency => {
            let (recent, other): (Vec<_>, Vec<_>) = entries.iter().partition(recent);
            vec![ProjectSection::auto("Recent", recent), ProjectSection::auto("Other", other)]
        }
        GroupingMode::Collection => {
            let mut assigned: HashSet<&Path> = HashSet::new();
            let mut sections = Vec::new();

            let recent_entries: Vec<&ProjectEntry> = entries.iter().filter(recent).collect();
            assigned.extend(recent_entries.iter().map(|entry| entry.project.path.as_path()));
            sections.push(ProjectSection::auto("Recent", recent_entries));

            for collection in collections.iter().filter(|collection| !collection.is_auto()) {
                let members: Vec<&ProjectEntry> = entries
                    .iter()
                    .filter(|entry| !assigned.contains(entry.project.path.as_path()))
                    .filter(|entry| entry.project.collections.contains(&collection.id))
                    .collect();
                assigned.extend(members.iter().map(|entry| entry.project.path.as_path()));
                sections.push(ProjectSection {
                    title: collection.name.clone(),
                    entries: members,
                    is_auto: false,
                });
            }

            let rest: Vec<&ProjectEntry> = entries
                .iter()
                .filter(|entry| !assigned.contains(entry.project.path.as_path()))
                .collect();
            sections.push(ProjectSection::auto("Uncategorized", rest));
            sections
        }
    };

    sections
        .into_iter()
        .filter(|section| !section.entries.is_empty())
        .collect()
}
