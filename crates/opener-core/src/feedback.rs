//! Serializable list payload handed to whatever renders the project list.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::ProjectEntry;
use crate::collections::Collection;
use crate::grouping::ProjectSection;
use crate::recency::{RecencyIndicator, format_relative_time, recency_indicator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSection {
    pub title: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    pub accessories: Vec<Accessory>,
    pub missing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accessory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<RecencyIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Options that change how items look, not which items appear.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_stale_indicator: bool,
    pub now: i64,
}

pub fn render_entries(
    sections: &[ProjectSection<'_>],
    collections: &[Collection],
    options: RenderOptions,
) -> Vec<ListSection> {
    let manual_names: HashMap<&str, &str> = collections
        .iter()
        .filter(|collection| !collection.is_auto())
        .map(|collection| (collection.id.as_str(), collection.name.as_str()))
        .collect();

    sections
        .iter()
        .map(|section| ListSection {
            title: section.title.clone(),
            items: section
                .entries
                .iter()
                .map(|entry| {
                    // Manual sections already say which collection the item is in.
                    let subtitle = if section.is_auto {
                        collection_names(entry, &manual_names)
                    } else {
                        None
                    };
                    render_item(entry, subtitle, options)
                })
                .collect(),
        })
        .collect()
}

fn render_item(entry: &ProjectEntry, subtitle: Option<String>, options: RenderOptions) -> ListItem {
    let last_opened = entry.project.last_opened;
    let mut accessories = Vec::new();

    match recency_indicator(last_opened, options.now) {
        Some(RecencyIndicator::Stale) if !options.show_stale_indicator => {}
        Some(indicator) => accessories.push(Accessory {
            indicator: Some(indicator),
            text: None,
        }),
        None => {}
    }
    if let Some(text) = format_relative_time(last_opened, options.now) {
        accessories.push(Accessory {
            indicator: None,
            text: Some(text),
        });
    }

    ListItem {
        title: entry.title().to_string(),
        subtitle,
        path: entry.project.path_key(),
        icon_color: entry.settings.icon_color.clone(),
        accessories,
        missing: entry.missing,
    }
}

fn collection_names(entry: &ProjectEntry, manual_names: &HashMap<&str, &str>) -> Option<String> {
    let names: Vec<&str> = entry
        .project
        .collections
        .iter()
        .filter_map(|id| manual_names.get(id.as_str()).copied())
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}
