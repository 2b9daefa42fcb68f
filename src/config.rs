//! Configuration module for route generation.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`routegen.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ROUTEGEN_` and use double
//! underscores to separate nested levels:
//! - `ROUTEGEN_WATCH__DEBOUNCE_MS=200` sets `watch.debounce_ms`
//! - `ROUTEGEN_ROUTES__ROOT_REDIRECT=/dashboard` sets `routes.root_redirect`
//! - `ROUTEGEN_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{RouterError, RouterResult};

/// Name of the configuration file searched for in the project tree.
pub const CONFIG_FILE_NAME: &str = "routegen.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base for resolving every relative path below
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub alias: AliasConfig,

    /// Available layouts. The first entry is the default layout.
    #[serde(default = "default_layouts")]
    pub layouts: Vec<LayoutConfig>,

    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PagesConfig {
    /// Directories scanned for page files, relative to the project root
    #[serde(default = "default_page_dirs")]
    pub dirs: Vec<String>,

    /// Globs a page file must match (relative to its page dir)
    #[serde(default = "default_page_include")]
    pub include: Vec<String>,

    /// Globs that disqualify a page file
    #[serde(default = "default_page_exclude")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Directory holding the manifest and the import registry
    #[serde(default = "default_generated_dir")]
    pub generated_dir: String,

    /// Manifest file name inside `generated_dir`
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Import registry file name inside `generated_dir`
    #[serde(default = "default_imports")]
    pub imports: String,

    /// Type declaration file, relative to the project root
    #[serde(default = "default_dts")]
    pub dts: String,

    /// Generator-managed state (snapshot, backups, exclusions)
    #[serde(default = "default_support_dir")]
    pub support_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AliasConfig {
    /// tsconfig used to derive aliases from `compilerOptions.paths`
    #[serde(default = "default_tsconfig")]
    pub tsconfig: String,

    /// Explicit aliases (`"@" = "src"`); these win over tsconfig entries
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    pub name: String,

    /// Layout module, relative to the project root
    pub path: String,

    #[serde(default = "default_true")]
    pub lazy: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RoutesConfig {
    /// Redirect target attached to the Root route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_redirect: Option<String>,

    /// Component bound to the NotFound route
    #[serde(default = "default_not_found_component")]
    pub not_found_component: String,

    /// Route patterns without a backing page file
    #[serde(default)]
    pub reuse: Vec<String>,

    /// Component bound to every reuse route
    #[serde(default = "default_reuse_component")]
    pub reuse_component: String,

    /// Whether page components load lazily by default
    #[serde(default = "default_true")]
    pub lazy: bool,

    /// Route names imported eagerly regardless of `lazy`
    #[serde(default)]
    pub eager: Vec<String>,

    /// Origin path -> route name overrides
    #[serde(default)]
    pub names: BTreeMap<String, String>,

    /// Route name -> path overrides
    #[serde(default)]
    pub paths: BTreeMap<String, String>,

    /// Route name -> layout overrides
    #[serde(default)]
    pub layouts: BTreeMap<String, String>,

    /// Route name -> metadata merged additively into the route's `handle`
    #[serde(default)]
    pub handles: BTreeMap<String, serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quiet period before a burst of changes triggers regeneration
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every module
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides (`watcher = "debug"`)
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_page_dirs() -> Vec<String> {
    vec!["src/pages".to_string()]
}
fn default_page_include() -> Vec<String> {
    vec!["**/*.tsx".to_string(), "**/*.jsx".to_string()]
}
fn default_page_exclude() -> Vec<String> {
    vec!["**/components/**".to_string()]
}
fn default_generated_dir() -> String {
    "src/router/_generated".to_string()
}
fn default_manifest() -> String {
    "routes.ts".to_string()
}
fn default_imports() -> String {
    "imports.ts".to_string()
}
fn default_dts() -> String {
    "src/types/elegant-router.d.ts".to_string()
}
fn default_support_dir() -> String {
    ".routegen".to_string()
}
fn default_tsconfig() -> String {
    "tsconfig.json".to_string()
}
fn default_layouts() -> Vec<LayoutConfig> {
    vec![
        LayoutConfig {
            name: "base".to_string(),
            path: "src/layouts/base/index.tsx".to_string(),
            lazy: true,
        },
        LayoutConfig {
            name: "blank".to_string(),
            path: "src/layouts/blank/index.tsx".to_string(),
            lazy: true,
        },
    ]
}
fn default_not_found_component() -> String {
    "404".to_string()
}
fn default_reuse_component() -> String {
    "Wip".to_string()
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            project_root: None,
            pages: PagesConfig::default(),
            output: OutputConfig::default(),
            alias: AliasConfig::default(),
            layouts: default_layouts(),
            routes: RoutesConfig::default(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            dirs: default_page_dirs(),
            include: default_page_include(),
            exclude: default_page_exclude(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generated_dir: default_generated_dir(),
            manifest: default_manifest(),
            imports: default_imports(),
            dts: default_dts(),
            support_dir: default_support_dir(),
        }
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            tsconfig: default_tsconfig(),
            entries: BTreeMap::new(),
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            root_redirect: Some("/home".to_string()),
            not_found_component: default_not_found_component(),
            reuse: Vec::new(),
            reuse_component: default_reuse_component(),
            lazy: true,
            eager: Vec::new(),
            names: BTreeMap::new(),
            paths: BTreeMap::new(),
            layouts: BTreeMap::new(),
            handles: BTreeMap::new(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> RouterResult<Self> {
        let config_path =
            Self::find_config_file().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let mut settings: Settings = Self::figment(&config_path)
            .extract()
            .map_err(Box::new)?;

        if settings.project_root.is_none() {
            settings.project_root = config_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf);
        }

        Ok(settings)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> RouterResult<Self> {
        let path = path.as_ref();
        let mut settings: Settings = Self::figment(path).extract().map_err(Box::new)?;

        if settings.project_root.is_none() {
            settings.project_root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf);
        }

        Ok(settings)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels
            .merge(Env::prefixed("ROUTEGEN_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `routegen.toml` by searching from the current directory up to root
    fn find_config_file() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Reject settings no regeneration can succeed with.
    pub fn validate(&self) -> RouterResult<()> {
        if self.layouts.is_empty() {
            return Err(RouterError::NoLayouts);
        }
        Ok(())
    }

    /// Project root, falling back to the current directory.
    pub fn root(&self) -> PathBuf {
        match &self.project_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => std::env::current_dir()
                .map(|cwd| cwd.join(root))
                .unwrap_or_else(|_| root.clone()),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Page file extensions, taken from the include globs (`**/*.tsx` -> `tsx`).
    pub fn page_extensions(&self) -> Vec<String> {
        let mut extensions = Vec::new();
        for pattern in &self.pages.include {
            if let Some((_, ext)) = pattern.rsplit_once('.') {
                if !ext.is_empty() && !ext.contains('/') && !extensions.iter().any(|e| e == ext)
                {
                    extensions.push(ext.to_string());
                }
            }
        }
        extensions
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root()
            .join(&self.output.generated_dir)
            .join(&self.output.manifest)
    }

    pub fn imports_path(&self) -> PathBuf {
        self.root()
            .join(&self.output.generated_dir)
            .join(&self.output.imports)
    }

    pub fn dts_path(&self) -> PathBuf {
        self.root().join(&self.output.dts)
    }

    pub fn support_dir(&self) -> PathBuf {
        self.root().join(&self.output.support_dir)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> RouterResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RouterError::io(parent, e))?;
        }

        let toml_string =
            toml::to_string_pretty(self).map_err(|e| RouterError::Serialization(e.to_string()))?;
        std::fs::write(path, toml_string).map_err(|e| RouterError::io(path, e))?;

        Ok(())
    }

    /// Create a default settings file in `dir`
    pub fn init_config_file(dir: &Path, force: bool) -> RouterResult<PathBuf> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !force && config_path.exists() {
            return Err(RouterError::AlreadyExists { path: config_path });
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.pages.dirs, vec!["src/pages"]);
        assert_eq!(settings.layouts[0].name, "base");
        assert_eq!(settings.watch.debounce_ms, 500);
        assert_eq!(settings.routes.root_redirect.as_deref(), Some("/home"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_page_extensions_from_include() {
        let mut settings = Settings::default();
        settings.pages.include = vec![
            "**/*.tsx".to_string(),
            "**/*.jsx".to_string(),
            "**/*.tsx".to_string(),
        ];
        assert_eq!(settings.page_extensions(), vec!["tsx", "jsx"]);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let toml_content = r#"
[pages]
dirs = ["app/views"]

[[layouts]]
name = "main"
path = "src/layouts/main.tsx"
lazy = false

[routes]
root_redirect = "/dashboard"
eager = ["Home"]

[routes.handles.Home]
title = "Home"

[watch]
debounce_ms = 200
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.pages.dirs, vec!["app/views"]);
        // Unspecified include patterns keep their defaults
        assert_eq!(settings.pages.include.len(), 2);
        assert_eq!(settings.layouts.len(), 1);
        assert!(!settings.layouts[0].lazy);
        assert_eq!(settings.routes.root_redirect.as_deref(), Some("/dashboard"));
        assert_eq!(settings.routes.handles["Home"]["title"], "Home");
        assert_eq!(settings.watch.debounce_ms, 200);
        assert_eq!(settings.project_root.as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_empty_layouts_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "layouts = []\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert!(matches!(settings.validate(), Err(RouterError::NoLayouts)));
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut settings = Settings::default();
        settings.watch.debounce_ms = 750;
        settings.routes.reuse = vec!["/reuse/:id".to_string()];

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.watch.debounce_ms, 750);
        assert_eq!(loaded.routes.reuse, vec!["/reuse/:id"]);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        Settings::init_config_file(temp_dir.path(), false).unwrap();
        let result = Settings::init_config_file(temp_dir.path(), false);
        assert!(matches!(result, Err(RouterError::AlreadyExists { .. })));
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }
}
