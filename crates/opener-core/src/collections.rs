//! Manual collections (persisted) and the fixed set of rule-based auto
//! collections, plus the membership rules for the latter.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::EnhancedProject;
use crate::config::RuntimeConfig;
use crate::error::OpenerError;
use crate::icons::generate_id;
use crate::recency::DAY_MS;
use crate::settings::SettingsStore;
use crate::store::JsonStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Manual,
    Auto,
}

/// Membership rule of an auto collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AutoCriteria {
    Recent {
        #[serde(default)]
        days: i64,
    },
    Stale {
        #[serde(default)]
        days: i64,
    },
    GitOrg {
        #[serde(rename = "orgName")]
        org_name: String,
    },
    Uncategorized,
    #[serde(other)]
    Unknown,
}

/// The compiled-in auto collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoKind {
    Recent,
    Month,
    Stale,
    Uncategorized,
}

impl AutoKind {
    pub const ALL: [AutoKind; 4] = [Self::Recent, Self::Month, Self::Stale, Self::Uncategorized];

    pub fn id(self) -> &'static str {
        match self {
            Self::Recent => "_recent",
            Self::Month => "_month",
            Self::Stale => "_stale",
            Self::Uncategorized => "_uncategorized",
        }
    }

    /// Short name accepted after `#` in a search query.
    pub fn alias(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Month => "month",
            Self::Stale => "stale",
            Self::Uncategorized => "uncategorized",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Recent => "Recent",
            Self::Month => "This Month",
            Self::Stale => "Stale",
            Self::Uncategorized => "Uncategorized",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Recent => "Clock",
            Self::Month => "Calendar",
            Self::Stale => "ExclamationMark",
            Self::Uncategorized => "QuestionMark",
        }
    }

    pub fn criteria(self) -> AutoCriteria {
        match self {
            Self::Recent => AutoCriteria::Recent { days: 7 },
            Self::Month => AutoCriteria::Recent { days: 30 },
            Self::Stale => AutoCriteria::Stale { days: 90 },
            Self::Uncategorized => AutoCriteria::Uncategorized,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.alias() == alias)
    }

    pub fn collection(self) -> Collection {
        Collection {
            id: self.id().to_string(),
            name: self.name().to_string(),
            kind: CollectionKind::Auto,
            icon: Some(self.icon().to_string()),
            color: None,
            criteria: Some(self.criteria()),
        }
    }
}

/// A collection id resolved into its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionRef {
    Manual(String),
    Auto(AutoKind),
}

impl CollectionRef {
    pub fn from_id(id: &str) -> Self {
        match AutoKind::from_id(id) {
            Some(kind) => Self::Auto(kind),
            None => Self::Manual(id.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Manual(id) => id,
            Self::Auto(kind) => kind.id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<AutoCriteria>,
}

impl Collection {
    pub fn is_auto(&self) -> bool {
        self.kind == CollectionKind::Auto
    }

    /// Auto collection grouping every project whose origin owner is `org_name`.
    pub fn git_org(org_name: &str) -> Self {
        Self {
            id: format!("_org_{}", org_name.to_lowercase()),
            name: org_name.to_string(),
            kind: CollectionKind::Auto,
            icon: Some("Globe".to_string()),
            color: None,
            criteria: Some(AutoCriteria::GitOrg {
                org_name: org_name.to_string(),
            }),
        }
    }
}

pub fn auto_collections() -> Vec<Collection> {
    AutoKind::ALL.into_iter().map(AutoKind::collection).collect()
}

/// Whether `project` satisfies an auto collection's rule. Manual collections
/// and unknown rule kinds never match.
pub fn matches_auto_collection(
    project: &EnhancedProject,
    collection: &Collection,
    now: i64,
) -> bool {
    if !collection.is_auto() {
        return false;
    }
    let Some(criteria) = &collection.criteria else {
        return false;
    };

    match criteria {
        AutoCriteria::Recent { days } => project
            .last_opened
            .is_some_and(|opened| opened >= now - days * DAY_MS),
        AutoCriteria::Stale { days } => project
            .last_opened
            .is_some_and(|opened| opened < now - days * DAY_MS),
        AutoCriteria::GitOrg { org_name } => project.git_org.as_deref() == Some(org_name.as_str()),
        AutoCriteria::Uncategorized => project.collections.is_empty(),
        AutoCriteria::Unknown => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Persisted manual collections (`collections.json`).
#[derive(Debug, Clone)]
pub struct CollectionStore {
    store: JsonStore<Vec<Collection>>,
}

impl CollectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.collections_file())
    }

    pub fn load(&self) -> Vec<Collection> {
        self.store.load_or_default()
    }

    /// Manual collections in stored order, followed by the auto set.
    pub fn all(&self) -> Vec<Collection> {
        let mut all = self.load();
        all.extend(auto_collections());
        all
    }

    pub fn by_id(&self, id: &str) -> Option<Collection> {
        self.all().into_iter().find(|collection| collection.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<Collection> {
        find_by_name(&self.all(), name).cloned()
    }

    pub fn create(
        &self,
        name: &str,
        icon: Option<String>,
        color: Option<String>,
        now_ms: i64,
    ) -> Result<Collection, OpenerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OpenerError::EmptyCollectionName);
        }

        let collection = Collection {
            id: generate_id("coll", now_ms),
            name: name.to_string(),
            kind: CollectionKind::Manual,
            icon,
            color,
            criteria: None,
        };

        let mut collections = self.load();
        collections.push(collection.clone());
        self.store.save(&collections)?;
        info!(id = %collection.id, name = %collection.name, "created collection");
        Ok(collection)
    }

    pub fn update(&self, id: &str, update: CollectionUpdate) -> Result<Collection, OpenerError> {
        let id = manual_id(id)?;
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(OpenerError::EmptyCollectionName);
            }
        }

        let mut collections = self.load();
        let collection = collections
            .iter_mut()
            .find(|collection| collection.id == id)
            .ok_or_else(|| OpenerError::UnknownCollection(id.clone()))?;

        if let Some(name) = update.name {
            collection.name = name.trim().to_string();
        }
        if let Some(icon) = update.icon {
            collection.icon = Some(icon);
        }
        if let Some(color) = update.color {
            collection.color = Some(color);
        }
        let updated = collection.clone();

        self.store.save(&collections)?;
        Ok(updated)
    }

    /// Delete a manual collection and prune it from every project's settings.
    /// Returns the number of project records that referenced it.
    pub fn delete(&self, id: &str, settings: &SettingsStore) -> Result<usize, OpenerError> {
        let id = manual_id(id)?;

        let collections = self.load();
        let remaining: Vec<Collection> = collections
            .iter()
            .filter(|collection| collection.id != id)
            .cloned()
            .collect();
        if remaining.len() == collections.len() {
            return Err(OpenerError::UnknownCollection(id));
        }

        self.store.save(&remaining)?;
        let cleaned = settings.remove_collection_from_all(&id)?;
        info!(id = %id, cleaned, "deleted collection");
        Ok(cleaned)
    }
}

/// Only manual collections are stored, so only they can be edited.
fn manual_id(id: &str) -> Result<String, OpenerError> {
    match CollectionRef::from_id(id) {
        CollectionRef::Manual(id) => Ok(id),
        CollectionRef::Auto(kind) => {
            Err(OpenerError::AutoCollectionReadOnly(kind.id().to_string()))
        }
    }
}

/// Case-insensitive name lookup across manual and auto collections.
pub fn find_by_name<'a>(collections: &'a [Collection], name: &str) -> Option<&'a Collection> {
    let wanted = name.to_lowercase();
    collections
        .iter()
        .find(|collection| collection.name.to_lowercase() == wanted)
}
