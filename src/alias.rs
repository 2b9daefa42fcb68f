//! Path alias table for import specifiers.
//!
//! Aliases come from `compilerOptions.paths` of the project's tsconfig
//! (JSONC, with `extends` chains) and from `[alias.entries]` in settings.
//! A page's absolute path is rewritten to the first alias, in key order,
//! whose target directory contains it: with `@ -> <root>/src`,
//! `<root>/src/pages/home/index.tsx` becomes `@/pages/home/index`.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use crate::config::AliasConfig;
use crate::error::{RouterError, RouterResult};

/// Alias key -> absolute, `/`-separated target directory.
pub type AliasTable = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Deserialize)]
struct CompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,

    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

/// The subset of tsconfig.json needed for alias resolution.
#[derive(Debug, Clone, Default, Deserialize)]
struct TsConfig {
    extends: Option<String>,

    #[serde(default, rename = "compilerOptions")]
    compiler_options: CompilerOptions,

    /// Absolute `baseUrl`, resolved against the file that declares it.
    #[serde(skip)]
    base_dir: Option<PathBuf>,

    /// Directory of the file that declares `paths`.
    #[serde(skip)]
    paths_dir: Option<PathBuf>,
}

impl TsConfig {
    fn anchor(&mut self, dir: &Path) {
        self.base_dir = self
            .compiler_options
            .base_url
            .as_ref()
            .map(|base_url| dir.join(base_url));
        if !self.compiler_options.paths.is_empty() {
            self.paths_dir = Some(dir.to_path_buf());
        }
    }
}

/// Load the alias table for a project.
///
/// A missing tsconfig yields only the explicit entries; a tsconfig that
/// exists but cannot be read or parsed is an error.
pub fn load_aliases(root: &Path, config: &AliasConfig) -> RouterResult<AliasTable> {
    let tsconfig_path = root.join(&config.tsconfig);
    let mut aliases = AliasTable::new();

    if tsconfig_path.is_file() {
        let tsconfig = resolve_extends_chain(&tsconfig_path, &mut HashSet::new())?;
        aliases.extend(aliases_from_tsconfig(&tsconfig));
    } else {
        crate::debug_event!("alias", "no tsconfig", "{}", tsconfig_path.display());
    }

    for (key, target) in &config.entries {
        aliases.insert(key.clone(), normalize_path(&root.join(target)));
    }

    Ok(aliases)
}

fn parse_tsconfig(path: &Path, content: &str) -> RouterResult<TsConfig> {
    serde_json5::from_str(content).map_err(|e| RouterError::AliasSource {
        path: path.to_path_buf(),
        reason: format!("{e}. Check JSON syntax, comments, and trailing commas"),
    })
}

/// Resolve `extends` and merge, child overriding parent.
fn resolve_extends_chain(path: &Path, visited: &mut HashSet<PathBuf>) -> RouterResult<TsConfig> {
    let alias_error = |reason: String| RouterError::AliasSource {
        path: path.to_path_buf(),
        reason,
    };

    let canonical = path
        .canonicalize()
        .map_err(|e| alias_error(e.to_string()))?;

    if !visited.insert(canonical.clone()) {
        return Err(alias_error("circular extends chain".to_string()));
    }

    let content = std::fs::read_to_string(&canonical).map_err(|e| alias_error(e.to_string()))?;
    let mut config = parse_tsconfig(&canonical, &content)?;
    // Anchor on the path as given so aliases share the scanner's prefix
    let dir = path.parent().unwrap_or(Path::new("."));
    config.anchor(dir);

    if let Some(extends) = config.extends.clone() {
        // Package references (`@tsconfig/node20`) live in node_modules; skip them.
        if extends.starts_with('.') || Path::new(&extends).is_absolute() {
            let parent_path = extends_target(dir, &extends);
            let parent = resolve_extends_chain(&parent_path, visited)?;
            config = merge_tsconfig(parent, config);
        } else {
            crate::debug_event!("alias", "skipping package extends", "{extends}");
        }
    }

    visited.remove(&canonical);
    Ok(config)
}

/// `./tsconfig.base` names `./tsconfig.base.json` unless the file exists as written.
fn extends_target(dir: &Path, extends: &str) -> PathBuf {
    let path = dir.join(extends);
    if path.is_file() || extends.ends_with(".json") {
        return path;
    }
    let mut with_json = path.clone().into_os_string();
    with_json.push(".json");
    PathBuf::from(with_json)
}

fn merge_tsconfig(parent: TsConfig, child: TsConfig) -> TsConfig {
    let (base_url, base_dir) = if child.compiler_options.base_url.is_some() {
        (child.compiler_options.base_url, child.base_dir)
    } else {
        (parent.compiler_options.base_url, parent.base_dir)
    };
    // `paths` is replaced as a whole, never merged key by key
    let (paths, paths_dir) = if child.compiler_options.paths.is_empty() {
        (parent.compiler_options.paths, parent.paths_dir)
    } else {
        (child.compiler_options.paths, child.paths_dir)
    };

    TsConfig {
        extends: child.extends,
        compiler_options: CompilerOptions { base_url, paths },
        base_dir,
        paths_dir,
    }
}

/// `"@/*": ["./src/*"]` -> `@ -> <base>/src`, where `<base>` is `baseUrl`
/// or else the directory of the tsconfig declaring `paths`.
fn aliases_from_tsconfig(config: &TsConfig) -> AliasTable {
    let Some(base) = config.base_dir.as_ref().or(config.paths_dir.as_ref()) else {
        return AliasTable::new();
    };

    config
        .compiler_options
        .paths
        .iter()
        .filter_map(|(key, targets)| {
            let target = targets.first()?;
            let key = key.strip_suffix("/*").unwrap_or(key);
            let target = target.strip_suffix("/*").unwrap_or(target);
            Some((key.to_string(), normalize_path(&base.join(target))))
        })
        .collect()
}

/// Lexically clean a path (`.`/`..` removed) and use `/` separators.
pub fn normalize_path(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().replace('\\', "/")
}

/// Rewrite a file path into an import specifier: alias prefix, no extension.
pub fn resolve_import_path(file_path: &str, aliases: &AliasTable, extensions: &[String]) -> String {
    let mut path = file_path.replace('\\', "/");

    let matched = aliases.iter().find(|(_, dir)| {
        !dir.is_empty() && (path == **dir || path.starts_with(&format!("{dir}/")))
    });
    if let Some((key, dir)) = matched {
        path = format!("{key}{}", &path[dir.len()..]);
    }

    if let Some(ext) = extensions
        .iter()
        .find(|ext| path.ends_with(&format!(".{ext}")))
    {
        path.truncate(path.len() - ext.len() - 1);
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["tsx".to_string(), "jsx".to_string()]
    }

    fn table(entries: &[(&str, &str)]) -> AliasTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_alias_replace() {
        let aliases = table(&[("@", "/app/src")]);
        assert_eq!(
            resolve_import_path("/app/src/components/Button.tsx", &aliases, &exts()),
            "@/components/Button"
        );
    }

    #[test]
    fn test_first_alias_in_key_order_wins() {
        let aliases = table(&[("@", "/app/src"), ("~components", "/app/src/components")]);
        assert_eq!(
            resolve_import_path("/app/src/components/Button.jsx", &aliases, &exts()),
            "@/components/Button"
        );
    }

    #[test]
    fn test_no_alias_keeps_path() {
        let aliases = table(&[("@", "/app/src")]);
        assert_eq!(
            resolve_import_path("/app/srcx/Button.tsx", &aliases, &exts()),
            "/app/srcx/Button"
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/app/./src/../lib")), "/app/lib");
    }

    #[test]
    fn test_load_from_tsconfig_with_comments_and_extends() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(
            root.join("tsconfig.base.json"),
            r#"{
  // shared options
  "compilerOptions": {
    "baseUrl": ".",
    "paths": { "@/*": ["./src/*"], },
  },
}"#,
        )
        .unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "extends": "./tsconfig.base", "compilerOptions": { "strict": true } }"#,
        )
        .unwrap();

        let mut config = AliasConfig::default();
        config.entries.insert("~lib".to_string(), "lib".to_string());

        let aliases = load_aliases(root, &config).unwrap();
        let root_str = normalize_path(root);
        assert_eq!(aliases["@"], format!("{root_str}/src"));
        assert_eq!(aliases["~lib"], format!("{root_str}/lib"));
    }

    #[test]
    fn test_inherited_paths_resolve_from_declaring_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("config")).unwrap();

        fs::write(
            root.join("config/tsconfig.paths.json"),
            r#"{ "compilerOptions": { "paths": { "@/*": ["../src/*"] } } }"#,
        )
        .unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "extends": "./config/tsconfig.paths" }"#,
        )
        .unwrap();

        let aliases = load_aliases(root, &AliasConfig::default()).unwrap();
        let root = normalize_path(root);
        assert_eq!(aliases["@"], format!("{root}/src"));
    }

    #[test]
    fn test_child_base_url_anchors_inherited_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("config")).unwrap();

        fs::write(
            root.join("config/base.json"),
            r#"{ "compilerOptions": { "paths": { "~/*": ["app/*"] } } }"#,
        )
        .unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "extends": "./config/base.json", "compilerOptions": { "baseUrl": "./src" } }"#,
        )
        .unwrap();

        let aliases = load_aliases(root, &AliasConfig::default()).unwrap();
        let root = normalize_path(root);
        assert_eq!(aliases["~"], format!("{root}/src/app"));
    }

    #[test]
    fn test_missing_tsconfig_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let aliases = load_aliases(temp_dir.path(), &AliasConfig::default()).unwrap();
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_broken_tsconfig_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("tsconfig.json"), "{ compilerOptions: ").unwrap();

        let result = load_aliases(temp_dir.path(), &AliasConfig::default());
        assert!(matches!(result, Err(RouterError::AliasSource { .. })));
    }
}
