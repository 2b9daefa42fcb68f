//! Page file discovery.
//!
//! Walks each configured page directory and keeps files whose page-dir
//! relative path matches an include glob and no exclude glob. The result is
//! ordered by page-dir declaration order, then by relative path; that order
//! is the "scan order" conflict resolution relies on.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::alias::{AliasTable, normalize_path, resolve_import_path};
use crate::config::{PagesConfig, Settings};
use crate::error::{RouterError, RouterResult};
use crate::routes::ResolvedFile;

/// Build a glob set, rejecting invalid patterns.
pub fn build_globset(patterns: &[String]) -> RouterResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| RouterError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| RouterError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

/// Include/exclude filter over page-dir relative paths.
#[derive(Debug, Clone)]
pub struct PageFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl PageFilter {
    pub fn new(pages: &PagesConfig) -> RouterResult<Self> {
        Ok(Self {
            include: build_globset(&pages.include)?,
            exclude: build_globset(&pages.exclude)?,
        })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

/// OS file identity. Inode on Unix; creation time elsewhere.
#[cfg(unix)]
pub fn file_identity(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
pub fn file_identity(metadata: &Metadata) -> u64 {
    metadata
        .created()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

pub struct PageScanner {
    root: PathBuf,
    dirs: Vec<String>,
    filter: PageFilter,
    aliases: AliasTable,
    extensions: Vec<String>,
}

impl PageScanner {
    pub fn new(settings: &Settings, aliases: AliasTable) -> RouterResult<Self> {
        Ok(Self {
            root: settings.root(),
            dirs: settings.pages.dirs.clone(),
            filter: PageFilter::new(&settings.pages)?,
            aliases,
            extensions: settings.page_extensions(),
        })
    }

    /// Scan every page dir.
    pub fn scan(&self) -> RouterResult<Vec<ResolvedFile>> {
        let mut files = Vec::new();

        for dir in &self.dirs {
            let page_root = self.root.join(dir);
            if !page_root.is_dir() {
                crate::debug_event!("scan", "missing page dir", "{}", page_root.display());
                continue;
            }

            let mut found = Vec::new();
            for entry in WalkDir::new(&page_root).follow_links(false) {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| page_root.clone());
                    RouterError::io(path, e.into())
                })?;

                if !entry.file_type().is_file() {
                    continue;
                }

                let Ok(relative) = entry.path().strip_prefix(&page_root) else {
                    continue;
                };
                let relative = relative.to_string_lossy().replace('\\', "/");
                if !self.filter.matches(&relative) {
                    continue;
                }

                let metadata = entry
                    .metadata()
                    .map_err(|e| RouterError::io(entry.path(), e.into()))?;
                found.push(self.resolve_file(dir, relative, entry.path(), &metadata));
            }

            found.sort_by(|a, b| a.relative_glob.cmp(&b.relative_glob));
            crate::debug_event!("scan", "page dir", "{dir}: {} files", found.len());
            files.extend(found);
        }

        Ok(files)
    }

    fn resolve_file(
        &self,
        page_dir: &str,
        relative: String,
        path: &Path,
        metadata: &Metadata,
    ) -> ResolvedFile {
        let absolute = normalize_path(path);
        let module_import_path = resolve_import_path(&absolute, &self.aliases, &self.extensions);

        ResolvedFile {
            page_dir: page_dir.to_string(),
            relative_glob: relative,
            absolute_path: PathBuf::from(&absolute),
            module_import_path,
            identity: file_identity(metadata),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_roots(&self) -> Vec<PathBuf> {
        self.dirs.iter().map(|dir| self.root.join(dir)).collect()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Whether `path` lies below one of the page dirs.
    pub fn contains(&self, path: &Path) -> bool {
        let absolute = self.absolute(path);
        self.dirs
            .iter()
            .any(|dir| absolute.starts_with(self.root.join(dir)))
    }

    /// Page-dir relative form of a project path, if it lies in a page dir
    /// and passes the filter.
    pub fn page_relative(&self, path: &Path) -> Option<String> {
        let absolute = self.absolute(path);

        self.dirs.iter().find_map(|dir| {
            let relative = absolute.strip_prefix(self.root.join(dir)).ok()?;
            let relative = relative.to_string_lossy().replace('\\', "/");
            self.filter.matches(&relative).then_some(relative)
        })
    }
}
