//! Search query language: free text plus `#collection`, `lang:`, `org:` and
//! `in:` tokens. A repeated filter kind keeps only its last occurrence.

use crate::collections::AutoKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionFilter {
    Auto(AutoKind),
    /// Lower-cased collection name, resolved against the collection set at match time.
    Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub collection: Option<CollectionFilter>,
    pub lang: Option<String>,
    pub org: Option<String>,
    pub in_path: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.collection.is_none()
            && self.lang.is_none()
            && self.org.is_none()
            && self.in_path.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub text: String,
    pub filters: SearchFilters,
}

const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("node", "javascript"),
    ("py", "python"),
    ("rb", "ruby"),
    ("rs", "rust"),
    ("golang", "go"),
    ("kt", "kotlin"),
    ("c++", "cpp"),
    ("cxx", "cpp"),
    ("cc", "cpp"),
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("dotnet", "csharp"),
    ("flutter", "dart"),
    ("ex", "elixir"),
    ("sc", "scala"),
    ("php8", "php"),
    ("ios", "swift"),
];

/// Lower-case a language value and map known aliases to their canonical name.
pub fn normalize_language(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(lowered)
}

/// A filter token with nothing after its prefix (`#`, `lang:`) is consumed and
/// clears that filter, so a half-typed token never hides every project.
pub fn parse_search_query(query: &str) -> ParsedQuery {
    let mut filters = SearchFilters::default();
    let mut text_parts = Vec::new();

    for token in query.split_whitespace() {
        if let Some(name) = token.strip_prefix('#') {
            filters.collection = non_empty(name).map(parse_collection);
        } else if let Some(value) = token.strip_prefix("lang:") {
            filters.lang = non_empty(value).map(normalize_language);
        } else if let Some(value) = token.strip_prefix("org:") {
            filters.org = non_empty(value).map(str::to_lowercase);
        } else if let Some(value) = token.strip_prefix("in:") {
            filters.in_path = non_empty(value).map(str::to_string);
        } else {
            text_parts.push(token);
        }
    }

    ParsedQuery {
        text: text_parts.join(" "),
        filters,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn parse_collection(name: &str) -> CollectionFilter {
    let name = name.to_lowercase();
    AutoKind::from_alias(&name)
        .or_else(|| AutoKind::from_id(&name))
        .map(CollectionFilter::Auto)
        .unwrap_or(CollectionFilter::Name(name))
}

/// Render a parsed query back into tokens that parse to the same filters.
pub fn to_query_string(query: &ParsedQuery) -> String {
    let filters = &query.filters;
    let mut tokens = Vec::new();

    match &filters.collection {
        Some(CollectionFilter::Auto(kind)) => tokens.push(format!("#{}", kind.alias())),
        Some(CollectionFilter::Name(name)) => tokens.push(format!("#{name}")),
        None => {}
    }
    if let Some(lang) = &filters.lang {
        tokens.push(format!("lang:{lang}"));
    }
    if let Some(org) = &filters.org {
        tokens.push(format!("org:{org}"));
    }
    if let Some(in_path) = &filters.in_path {
        tokens.push(format!("in:{in_path}"));
    }
    if !query.text.is_empty() {
        tokens.push(query.text.clone());
    }

    tokens.join(" ")
}
