//! File path to URL pattern grammar.
//!
//! A page's path relative to its page directory maps to a canonical route
//! path as follows:
//!
//! | file                         | path               |
//! |------------------------------|--------------------|
//! | `about/index.tsx`            | `/about`           |
//! | `list/[id].tsx`              | `/list/:id`        |
//! | `list/[[id]].tsx`            | `/list/:id?`       |
//! | `list/edit_[id]_[userId].tsx`| `/list/edit/:id/:userId` |
//! | `(blank)/login/index.tsx`    | `/login`, group `blank` |
//!
//! Optional parameters take precedence: when a path contains any `[[x]]`
//! token, single-bracket tokens on the same path are left as they are.

use regex::Regex;
use std::sync::LazyLock;

use super::node::{ParamKind, RouteParams};

static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\((\w+)\)/").expect("valid group regex"));
static OPTIONAL_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(\w+)\]\]").expect("valid optional param regex"));
static REQUIRED_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)\]").expect("valid required param regex"));
static JOINED_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/:(\w+\?\w+|\w{2,})/:").expect("valid joined param regex"));

/// Result of running a relative file path through the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical URL pattern
    pub path: String,
    /// Path after extension/index stripping, before group and params
    pub origin_path: String,
    pub group: Option<String>,
}

/// Resolve a page-dir relative file path into its route path.
pub fn resolve_path(relative: &str, extensions: &[String]) -> ResolvedPath {
    let stripped = strip_file_path(relative, extensions);
    let origin_path = if stripped.is_empty() {
        "/".to_string()
    } else {
        stripped
    };

    let (grouped, group) = extract_group(&origin_path);
    let path = rewrite_params(&grouped);

    ResolvedPath {
        path,
        origin_path,
        group,
    }
}

/// Leading slash, one trailing extension removed, trailing `/index` removed.
fn strip_file_path(relative: &str, extensions: &[String]) -> String {
    let normalized = relative.replace('\\', "/");
    let mut path = if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{normalized}")
    };

    if let Some(ext) = extensions
        .iter()
        .find(|ext| path.ends_with(&format!(".{ext}")))
    {
        path.truncate(path.len() - ext.len() - 1);
    }

    if let Some(parent) = path.strip_suffix("/index") {
        path = parent.to_string();
    }

    path
}

/// Remove a single `/(group)/` marker, returning the group name.
pub fn extract_group(path: &str) -> (String, Option<String>) {
    match GROUP_RE.captures(path) {
        Some(caps) => {
            let group = caps[1].to_string();
            (GROUP_RE.replace(path, "/").into_owned(), Some(group))
        }
        None => (path.to_string(), None),
    }
}

/// Rewrite bracket tokens into `:param` / `:param?` segments.
pub fn rewrite_params(path: &str) -> String {
    let rewritten = if OPTIONAL_PARAM_RE.is_match(path) {
        OPTIONAL_PARAM_RE.replace_all(path, ":${1}?")
    } else if REQUIRED_PARAM_RE.is_match(path) {
        REQUIRED_PARAM_RE.replace_all(path, ":${1}")
    } else {
        return path.to_string();
    };

    split_joined_params(&rewritten)
}

/// `edit_:id_:userId` -> `edit/:id/:userId`, then split one remaining
/// underscore-joined pair between two parameters onto its own segment.
fn split_joined_params(path: &str) -> String {
    let path = path.replace("_:", "/:");

    JOINED_PARAM_RE
        .replace(&path, |caps: &regex::Captures| caps[0].replacen('_', "/", 1))
        .into_owned()
}

/// One token of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Static(String),
    Param { name: String, optional: bool },
}

/// Split a route path into segments of literal and parameter tokens.
///
/// Parameters are `:name`, optionally followed by a `(regex)` constraint and
/// one of the modifiers `?`, `*` or `+`. `?` and `*` make a parameter optional.
pub fn tokenize_path(path: &str) -> Vec<Vec<PathToken>> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(tokenize_segment)
        .collect()
}

fn tokenize_segment(segment: &str) -> Vec<PathToken> {
    let chars: Vec<char> = segment.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let is_param_start = chars[i] == ':'
            && chars
                .get(i + 1)
                .is_some_and(|c| c.is_alphanumeric() || *c == '_');

        if !is_param_start {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        if !literal.is_empty() {
            tokens.push(PathToken::Static(std::mem::take(&mut literal)));
        }

        i += 1;
        let start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect();

        // Custom regex constraint, e.g. `:pathMatch(.*)`
        if chars.get(i) == Some(&'(') {
            let mut depth = 0usize;
            while i < chars.len() {
                match chars[i] {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        }

        let mut optional = false;
        if let Some(modifier) = chars.get(i) {
            match modifier {
                '?' | '*' => {
                    optional = true;
                    i += 1;
                }
                '+' => i += 1,
                _ => {}
            }
        }

        tokens.push(PathToken::Param { name, optional });
    }

    if !literal.is_empty() {
        tokens.push(PathToken::Static(literal));
    }

    tokens
}

/// Parameter map of a canonical path, in order of appearance.
pub fn params_from_path(path: &str) -> RouteParams {
    let mut params = RouteParams::new();

    for token in tokenize_path(path).into_iter().flatten() {
        if let PathToken::Param { name, optional } = token {
            let kind = if optional {
                ParamKind::Optional
            } else {
                ParamKind::Required
            };
            params.insert(name, kind);
        }
    }

    params
}

/// `hello-world_page` -> `HelloWorldPage`.
pub fn pascal_case(input: &str) -> String {
    input
        .split(|c: char| matches!(c, '-' | '_' | '/' | '.') || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Default route name of a canonical path (`/blog/:id` -> `BlogId`).
pub fn route_name_from_path(path: &str) -> String {
    let cleaned = path.replace([':', '?'], "");
    let name = pascal_case(&cleaned.split('/').collect::<Vec<_>>().join("-"));

    if name.is_empty() {
        "Index".to_string()
    } else {
        name
    }
}

/// Identifier used when importing a route's module (`404` -> `_404`).
pub fn import_name(name: &str) -> String {
    let key = pascal_case(name);

    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        format!("_{key}")
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["tsx".to_string(), "jsx".to_string()]
    }

    #[test]
    fn test_index_and_extension_stripping() {
        assert_eq!(resolve_path("about/index.tsx", &exts()).path, "/about");
        assert_eq!(resolve_path("/about.tsx", &exts()).path, "/about");
        assert_eq!(resolve_path("about.jsx", &exts()).path, "/about");
        // Only one extension is removed
        assert_eq!(resolve_path("about.tsx.tsx", &exts()).path, "/about.tsx");
    }

    #[test]
    fn test_top_level_index_is_root_path() {
        let resolved = resolve_path("index.tsx", &exts());
        assert_eq!(resolved.path, "/");
        assert_eq!(route_name_from_path(&resolved.path), "Index");
    }

    #[test]
    fn test_optional_and_required_params() {
        let optional = resolve_path("list/[[id]].tsx", &exts());
        assert_eq!(optional.path, "/list/:id?");
        let params = params_from_path(&optional.path);
        assert_eq!(params.get("id"), Some(&ParamKind::Optional));

        let required = resolve_path("list/[id].tsx", &exts());
        assert_eq!(required.path, "/list/:id");
        let params = params_from_path(&required.path);
        assert_eq!(params.get("id"), Some(&ParamKind::Required));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_multi_param_filename_splits_segments() {
        let resolved = resolve_path("list/edit_[id]_[userId].tsx", &exts());
        assert_eq!(resolved.path, "/list/edit/:id/:userId");

        let params = params_from_path(&resolved.path);
        let names: Vec<_> = params.keys().cloned().collect();
        assert_eq!(names, vec!["id", "userId"]);
        assert!(params.values().all(|k| *k == ParamKind::Required));
    }

    #[test]
    fn test_joined_optional_params() {
        let resolved = resolve_path("search/[[q]]_[[page]].tsx", &exts());
        assert_eq!(resolved.path, "/search/:q?/:page?");
    }

    #[test]
    fn test_literal_between_params_is_split() {
        assert_eq!(rewrite_params("/list/[id]_detail_[uid]"), "/list/:id/detail/:uid");
    }

    #[test]
    fn test_optional_wins_over_required() {
        // Mixed forms: only the optional rewrite runs
        assert_eq!(rewrite_params("/a/[[x]]/[y]"), "/a/:x?/[y]");
    }

    #[test]
    fn test_group_marker_is_extracted() {
        let resolved = resolve_path("(blank)/login/index.tsx", &exts());
        assert_eq!(resolved.path, "/login");
        assert_eq!(resolved.group.as_deref(), Some("blank"));
        assert_eq!(resolved.origin_path, "/(blank)/login");
    }

    #[test]
    fn test_nested_params() {
        let resolved = resolve_path("list/detail/[id]/[userId].tsx", &exts());
        assert_eq!(resolved.path, "/list/detail/:id/:userId");
        assert_eq!(route_name_from_path(&resolved.path), "ListDetailIdUserId");
    }

    #[test]
    fn test_tokenize_constraint_and_modifiers() {
        let tokens = tokenize_path("/:pathMatch(.*)*");
        assert_eq!(
            tokens,
            vec![vec![PathToken::Param {
                name: "pathMatch".to_string(),
                optional: true
            }]]
        );

        let tokens = tokenize_path("/files/v:version+");
        assert_eq!(
            tokens[1],
            vec![
                PathToken::Static("v".to_string()),
                PathToken::Param {
                    name: "version".to_string(),
                    optional: false
                }
            ]
        );
    }

    #[test]
    fn test_route_names() {
        assert_eq!(route_name_from_path("/user/profile"), "UserProfile");
        assert_eq!(route_name_from_path("/blog/:id"), "BlogId");
        assert_eq!(route_name_from_path("/search?query"), "Searchquery");
        assert_eq!(route_name_from_path("/user-info/:id?"), "UserInfoId");
    }

    #[test]
    fn test_import_names() {
        assert_eq!(import_name("123"), "_123");
        assert_eq!(import_name("test"), "Test");
        assert_eq!(import_name("user-info"), "UserInfo");
        assert_eq!(import_name("test_123"), "Test123");
        assert_eq!(import_name("test123"), "Test123");
    }
}
