use crate::catalog::EnhancedProject;
use crate::collections::{Collection, CollectionKind, find_by_name, matches_auto_collection};
use crate::config::expand_path;
use crate::query::{CollectionFilter, ParsedQuery};

/// Everything a match needs beyond the project itself.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// Manual and auto collections, for resolving `#name` filters.
    pub collections: &'a [Collection],
    pub home: &'a str,
    pub now: i64,
}

/// All present predicates must hold. A predicate whose attribute is absent on
/// the project fails.
pub fn matches_search(
    project: &EnhancedProject,
    query: &ParsedQuery,
    ctx: &MatchContext<'_>,
) -> bool {
    if !query.text.is_empty()
        && !project
            .name
            .to_lowercase()
            .contains(&query.text.to_lowercase())
    {
        return false;
    }

    let filters = &query.filters;

    if let Some(collection) = &filters.collection {
        if !matches_collection(project, collection, ctx) {
            return false;
        }
    }

    if let Some(lang) = &filters.lang {
        let detected = project.detected_lang.map(|language| language.as_str());
        if !detected.is_some_and(|detected| detected.eq_ignore_ascii_case(lang)) {
            return false;
        }
    }

    if let Some(org) = &filters.org {
        let org = org.to_lowercase();
        if !project
            .git_org
            .as_deref()
            .is_some_and(|git_org| git_org.to_lowercase().contains(&org))
        {
            return false;
        }
    }

    if let Some(in_path) = &filters.in_path {
        let prefix = expand_path(in_path, ctx.home);
        if !project.path.to_string_lossy().starts_with(&prefix) {
            return false;
        }
    }

    true
}

fn matches_collection(
    project: &EnhancedProject,
    filter: &CollectionFilter,
    ctx: &MatchContext<'_>,
) -> bool {
    match filter {
        CollectionFilter::Auto(kind) => {
            matches_auto_collection(project, &kind.collection(), ctx.now)
        }
        CollectionFilter::Name(name) => match find_by_name(ctx.collections, name) {
            None => false,
            Some(collection) if collection.kind == CollectionKind::Manual => {
                project.collections.iter().any(|id| *id == collection.id)
            }
            Some(collection) => matches_auto_collection(project, collection, ctx.now),
        },
    }
}
