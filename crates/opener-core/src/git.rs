use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Owner segment of the `origin` remote, read straight from `.git/config`.
///
/// Missing file, unreadable file, no origin section or an unrecognized URL
/// shape all mean "organization unknown".
pub fn extract_git_org(project_path: &Path) -> Option<String> {
    let config = fs::read_to_string(project_path.join(".git").join("config")).ok()?;
    let url = origin_url(&config)?;
    org_from_remote_url(&url)
}

/// `url =` value inside the `[remote "origin"]` section, if any.
pub fn origin_url(git_config: &str) -> Option<String> {
    static ORIGIN_URL: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = ORIGIN_URL
        .get_or_init(|| Regex::new(r#"(?m)\[remote "origin"\][^\[]*?^\s*url\s*=\s*(\S+)"#).ok())
        .as_ref()?;

    pattern
        .captures(git_config)
        .and_then(|captures| captures.get(1))
        .map(|url| url.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

/// `git@host:owner/repo(.git)` and `https://host/owner/repo(.git)` -> `owner`.
pub fn org_from_remote_url(remote_url: &str) -> Option<String> {
    let remote_url = remote_url.trim();

    let repo_path = if let Some(rest) = remote_url
        .strip_prefix("https://")
        .or_else(|| remote_url.strip_prefix("http://"))
    {
        let (_host, path) = rest.split_once('/')?;
        path
    } else if !remote_url.contains("://") {
        let (user_host, path) = remote_url.split_once(':')?;
        if !user_host.contains('@') {
            return None;
        }
        path
    } else {
        return None;
    };

    let mut segments = repo_path.trim_end_matches('/').split('/');
    let owner = segments.next().filter(|owner| !owner.is_empty())?;
    let repo = segments.next().filter(|repo| !repo.is_empty())?;
    if repo.trim_end_matches(".git").is_empty() {
        return None;
    }

    Some(owner.to_string())
}
