//! Completions for a filter token that is still being typed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::ProjectEntry;
use crate::collections::{AutoKind, Collection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSuggestion {
    /// The completed token, e.g. `lang:rust`.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Whole query with the partial token replaced.
    pub filter: String,
}

/// Suggest completions when the last token is a partial `#`, `lang:` or `org:`
/// filter. Anything else, including a query ending in whitespace, yields none.
pub fn suggest_filters(
    query: &str,
    catalog: &[ProjectEntry],
    collections: &[Collection],
) -> Vec<SearchSuggestion> {
    if query.is_empty() || query.ends_with(char::is_whitespace) {
        return Vec::new();
    }
    let head_len = query.rfind(char::is_whitespace).map_or(0, |index| index + 1);
    let (head, token) = query.split_at(head_len);

    // Keyed by completed token so duplicates collapse and output is sorted.
    let mut candidates: BTreeMap<String, Option<String>> = BTreeMap::new();

    if let Some(partial) = token.strip_prefix('#') {
        let partial = partial.to_lowercase();
        for kind in AutoKind::ALL {
            if kind.alias().starts_with(&partial) {
                candidates.insert(format!("#{}", kind.alias()), Some(kind.name().to_string()));
            }
        }
        for collection in collections.iter().filter(|collection| !collection.is_auto()) {
            let name = collection.name.to_lowercase();
            if name.starts_with(&partial) && !name.contains(char::is_whitespace) {
                candidates
                    .entry(format!("#{name}"))
                    .or_insert_with(|| Some(collection.name.clone()));
            }
        }
    } else if let Some(partial) = token.strip_prefix("lang:") {
        let partial = partial.to_lowercase();
        for language in catalog.iter().filter_map(|entry| entry.project.detected_lang) {
            if language.as_str().starts_with(&partial) {
                candidates.insert(
                    format!("lang:{}", language.as_str()),
                    Some(language.display_name().to_string()),
                );
            }
        }
    } else if let Some(partial) = token.strip_prefix("org:") {
        let partial = partial.to_lowercase();
        for org in catalog.iter().filter_map(|entry| entry.project.git_org.as_deref()) {
            let lowered = org.to_lowercase();
            if lowered.starts_with(&partial) {
                candidates.entry(format!("org:{lowered}")).or_insert_with(|| Some(org.to_string()));
            }
        }
    }

    candidates
        .into_iter()
        .map(|(title, subtitle)| SearchSuggestion {
            filter: format!("{head}{title}"),
            title,
            subtitle,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::catalog::EnhancedProject;
    use crate::collections::{CollectionKind, auto_collections};
    use crate::markers::Language;
    use crate::settings::ProjectSettings;

    use super::*;

    fn entry(lang: Option<Language>, org: Option<&str>) -> ProjectEntry {
        ProjectEntry {
            project: EnhancedProject {
                name: "p".into(),
                path: PathBuf::from("/p"),
                relative_path: "p".into(),
                collections: Vec::new(),
                last_opened: None,
                source_id: None,
                detected_lang: lang,
                git_org: org.map(str::to_string),
            },
            settings: ProjectSettings::default(),
            missing: false,
            invalid_ide: false,
        }
    }

    fn collections() -> Vec<Collection> {
        let mut all = vec![
            Collection {
                id: "coll_1".into(),
                name: "Side".into(),
                kind: CollectionKind::Manual,
                icon: None,
                color: None,
                criteria: None,
            },
            Collection {
                id: "coll_2".into(),
                name: "Side Quests".into(),
                kind: CollectionKind::Manual,
                icon: None,
                color: None,
                criteria: None,
            },
        ];
        all.extend(auto_collections());
        all
    }

    fn titles(suggestions: &[SearchSuggestion]) -> Vec<&str> {
        suggestions.iter().map(|suggestion| suggestion.title.as_str()).collect()
    }

    #[test]
    fn hash_prefix_offers_aliases_and_collection_names() {
        let suggestions = suggest_filters("api #s", &[], &collections());
        assert_eq!(titles(&suggestions), vec!["#side", "#stale"]);
        assert_eq!(suggestions[0].filter, "api #side");
        assert_eq!(suggestions[1].subtitle.as_deref(), Some("Stale"));

        assert_eq!(suggest_filters("#", &[], &collections()).len(), 5);
    }

    #[test]
    fn lang_and_org_come_from_the_catalog() {
        let catalog = vec![
            entry(Some(Language::Rust), Some("Acme")),
            entry(Some(Language::Ruby), Some("acme")),
            entry(Some(Language::Go), None),
            entry(None, Some("other")),
        ];

        let langs = suggest_filters("lang:r", &catalog, &[]);
        assert_eq!(titles(&langs), vec!["lang:ruby", "lang:rust"]);
        assert_eq!(langs[1].subtitle.as_deref(), Some("Rust"));

        let orgs = suggest_filters("x org:a", &catalog, &[]);
        assert_eq!(titles(&orgs), vec!["org:acme"]);
        assert_eq!(orgs[0].filter, "x org:acme");
    }

    #[test]
    fn plain_text_and_finished_tokens_get_nothing() {
        assert!(suggest_filters("api", &[], &collections()).is_empty());
        assert!(suggest_filters("#side ", &[], &collections()).is_empty());
        assert!(suggest_filters("", &[], &collections()).is_empty());
    }
}
