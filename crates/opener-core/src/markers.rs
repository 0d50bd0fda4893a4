//! Project-root markers and marker-based language detection.
//!
//! Detection is a heuristic over file names only. Nothing here reads file
//! contents.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Any of these entries inside a directory makes it a project root.
pub const PROJECT_MARKERS: &[&str] = &[
    ".git",
    "package.json",
    "Cargo.toml",
    "go.mod",
    "pyproject.toml",
    "Makefile",
    "pom.xml",
    "build.gradle",
    "CMakeLists.txt",
    "Gemfile",
    "composer.json",
    "Package.swift",
    "pubspec.yaml",
    "mix.exs",
    "build.sbt",
    "requirements.txt",
];

pub fn is_project(dir: &Path) -> bool {
    PROJECT_MARKERS
        .iter()
        .any(|marker| dir.join(marker).exists())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Go,
    Swift,
    Dart,
    Elixir,
    Scala,
    Ruby,
    Php,
    Java,
    Kotlin,
    Cpp,
    Python,
    Csharp,
    Typescript,
    Javascript,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Swift => "swift",
            Self::Dart => "dart",
            Self::Elixir => "elixir",
            Self::Scala => "scala",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::Csharp => "csharp",
            Self::Typescript => "typescript",
            Self::Javascript => "javascript",
        }
    }

    pub fn display_name(self) -> &'static str {
        LANGUAGE_OPTIONS
            .iter()
            .find(|option| option.language == self)
            .map(|option| option.name)
            .unwrap_or("Unknown")
    }

    pub fn parse(raw: &str) -> Option<Self> {
        LANGUAGE_OPTIONS
            .iter()
            .find(|option| option.language.as_str() == raw)
            .map(|option| option.language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageOption {
    pub name: &'static str,
    pub language: Language,
    pub alias: Option<&'static str>,
}

const fn language_option(
    name: &'static str,
    language: Language,
    alias: Option<&'static str>,
) -> LanguageOption {
    LanguageOption {
        name,
        language,
        alias,
    }
}

/// Ordered table shown wherever a language has to be picked by hand.
pub const LANGUAGE_OPTIONS: &[LanguageOption] = &[
    language_option("TypeScript", Language::Typescript, Some("ts")),
    language_option("JavaScript", Language::Javascript, Some("js")),
    language_option("Python", Language::Python, Some("py")),
    language_option("Rust", Language::Rust, Some("rs")),
    language_option("Go", Language::Go, Some("golang")),
    language_option("Ruby", Language::Ruby, Some("rb")),
    language_option("Java", Language::Java, None),
    language_option("Kotlin", Language::Kotlin, Some("kt")),
    language_option("Swift", Language::Swift, None),
    language_option("Dart", Language::Dart, Some("flutter")),
    language_option("PHP", Language::Php, None),
    language_option("C#", Language::Csharp, Some("cs")),
    language_option("C++", Language::Cpp, Some("c++")),
    language_option("Elixir", Language::Elixir, Some("ex")),
    language_option("Scala", Language::Scala, Some("sc")),
];

/// Priority-ordered single-marker checks. First hit wins, so a Tauri app with
/// both `Cargo.toml` and `package.json` is Rust.
const SINGLE_MARKER_RULES: &[(&str, Language)] = &[
    ("Cargo.toml", Language::Rust),
    ("go.mod", Language::Go),
    ("Package.swift", Language::Swift),
    ("pubspec.yaml", Language::Dart),
    ("mix.exs", Language::Elixir),
    ("build.sbt", Language::Scala),
    ("Gemfile", Language::Ruby),
    ("composer.json", Language::Php),
    ("pom.xml", Language::Java),
    ("build.gradle", Language::Kotlin),
    ("CMakeLists.txt", Language::Cpp),
];

const PYTHON_MARKERS: &[&str] = &["pyproject.toml", "requirements.txt", "setup.py"];
const DOTNET_SUFFIXES: &[&str] = &[".csproj", ".sln"];

pub fn detect_language(dir: &Path) -> Option<Language> {
    for (marker, language) in SINGLE_MARKER_RULES {
        if dir.join(marker).exists() {
            return Some(*language);
        }
    }

    if PYTHON_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
        return Some(Language::Python);
    }

    if has_dotnet_project_file(dir) {
        return Some(Language::Csharp);
    }

    if dir.join("package.json").exists() {
        if dir.join("tsconfig.json").exists() {
            return Some(Language::Typescript);
        }
        return Some(Language::Javascript);
    }

    None
}

fn has_dotnet_project_file(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        DOTNET_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn project_with(files: &[&str]) -> tempfile::TempDir {
        let temp = tempdir().expect("create temp dir");
        for file in files {
            fs::write(temp.path().join(file), "").expect("write marker");
        }
        temp
    }

    #[test]
    fn is_project_accepts_any_marker_and_rejects_plain_dirs() {
        let plain = project_with(&["README.md"]);
        assert!(!is_project(plain.path()));

        let gemfile = project_with(&["Gemfile"]);
        assert!(is_project(gemfile.path()));

        let git = tempdir().expect("create temp dir");
        fs::create_dir(git.path().join(".git")).expect("create .git");
        assert!(is_project(git.path()), ".git directory is a marker");
    }

    #[test]
    fn node_projects_split_on_tsconfig() {
        let ts = project_with(&["package.json", "tsconfig.json"]);
        assert_eq!(detect_language(ts.path()), Some(Language::Typescript));

        let js = project_with(&["package.json"]);
        assert_eq!(detect_language(js.path()), Some(Language::Javascript));
    }

    #[test]
    fn cargo_manifest_outranks_every_other_marker() {
        let tauri = project_with(&["Cargo.toml", "package.json", "tsconfig.json", "go.mod"]);
        assert_eq!(detect_language(tauri.path()), Some(Language::Rust));
    }

    #[test]
    fn python_outranks_node_but_not_jvm() {
        let mixed = project_with(&["requirements.txt", "package.json"]);
        assert_eq!(detect_language(mixed.path()), Some(Language::Python));

        let setup_only = project_with(&["setup.py"]);
        assert_eq!(detect_language(setup_only.path()), Some(Language::Python));

        let gradle = project_with(&["build.gradle", "requirements.txt"]);
        assert_eq!(detect_language(gradle.path()), Some(Language::Kotlin));
    }

    #[test]
    fn dotnet_detected_by_project_file_suffix() {
        let dotnet = project_with(&["App.csproj"]);
        assert_eq!(detect_language(dotnet.path()), Some(Language::Csharp));

        let solution = project_with(&["Thing.sln", "package.json"]);
        assert_eq!(detect_language(solution.path()), Some(Language::Csharp));
    }

    #[test]
    fn unknown_layout_has_no_language() {
        let unknown = project_with(&["Makefile"]);
        assert_eq!(detect_language(unknown.path()), None);
    }

    #[test]
    fn language_ids_round_trip_through_parse() {
        for option in LANGUAGE_OPTIONS {
            assert_eq!(Language::parse(option.language.as_str()), Some(option.language));
        }
        assert_eq!(Language::Cpp.display_name(), "C++");
        assert_eq!(Language::parse("cobol"), None);
    }
}
