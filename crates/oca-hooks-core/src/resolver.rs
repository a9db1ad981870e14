//! Manifest & module resolution.
//!
//! Raw path arguments may be manifests, module directories, directories
//! holding several modules, or single data files. Each is expanded so that
//! dependent rules always see the full file set the enclosing module
//! declares, no matter which of its files was named.

use crate::manifest::{Manifest, ManifestError};
use crate::registry::{MANIFEST_SYNTAX_ERROR, PATH_NOT_FOUND};
use crate::rule::{ExecutionMode, FileType};
use crate::types::Finding;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Catalog globs implied for every module, relative to its root.
const CATALOG_GLOBS: [&str; 2] = ["i18n*/*.po", "i18n*/*.pot"];

/// A file declared by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    /// Normalized absolute path.
    pub path: PathBuf,
    /// Path relative to the module root.
    pub short: PathBuf,
    /// Manifest key that declared it, or the i18n directory for catalogs.
    pub section: String,
    /// Artifact kind.
    pub file_type: FileType,
}

/// A module and its authoritative file set.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module root directory.
    pub root: PathBuf,
    /// Declaration file.
    pub manifest_path: PathBuf,
    /// Technical name (directory name of the root).
    pub name: String,
    /// Human-readable title from the manifest.
    pub title: Option<String>,
    /// Declared category.
    pub category: Option<String>,
    /// False when the manifest sets `installable` to a falsy value.
    pub installable: bool,
    /// Declared files that exist, in declaration order, deduplicated.
    pub files: Vec<ModuleFile>,
}

impl Module {
    /// Builds a module from a loaded manifest, expanding its data entries.
    #[must_use]
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let root = manifest.root().to_path_buf();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |path: PathBuf, section: &str| {
            let Some(file_type) = FileType::from_path(&path) else {
                debug!("Ignoring {} in {name}: no rule reads it", path.display());
                return;
            };
            if !seen.insert(path.clone()) {
                return;
            }
            let short = path.strip_prefix(&root).map_or_else(|_| path.clone(), Path::to_path_buf);
            files.push(ModuleFile {
                path,
                short,
                section: section.to_string(),
                file_type,
            });
        };

        for entry in &manifest.data {
            if is_glob(&entry.pattern) {
                for path in glob_under(&root, &entry.pattern) {
                    push(path, entry.section);
                }
                continue;
            }
            let path = normalize(&root.join(&entry.pattern));
            if path.is_file() {
                push(path, entry.section);
            } else {
                debug!(
                    "Declared file {} of {} does not exist",
                    entry.pattern,
                    manifest.path.display()
                );
            }
        }

        for pattern in CATALOG_GLOBS {
            for path in glob_under(&root, pattern) {
                let section = path
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                push(path, &section);
            }
        }

        Self {
            name,
            root,
            manifest_path: manifest.path.clone(),
            title: manifest.title.clone(),
            category: manifest.category.clone(),
            installable: manifest.installable,
            files,
        }
    }

    /// Looks up a declared file by its absolute path.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&ModuleFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Iterates over declared files of one artifact kind.
    pub fn files_of(&self, file_type: FileType) -> impl Iterator<Item = &ModuleFile> {
        self.files.iter().filter(move |f| f.file_type == file_type)
    }
}

/// A module scheduled for dependent rules.
#[derive(Debug, Clone)]
pub struct ModuleTarget {
    /// The module.
    pub module: Arc<Module>,
    /// Paths the user named explicitly that resolved to this module.
    pub requested: BTreeSet<PathBuf>,
}

/// A single file scheduled for independent rules.
#[derive(Debug, Clone)]
pub struct FileTarget {
    /// Normalized absolute path.
    pub path: PathBuf,
    /// Artifact kind.
    pub file_type: FileType,
    /// Enclosing module, when it loaded.
    pub module: Option<Arc<Module>>,
    /// Declaring data section within the module.
    pub section: Option<String>,
}

/// The scheduler's unit of work.
#[derive(Debug, Clone)]
pub enum ResolvedTarget {
    /// Dependent mode: a whole module.
    Module(ModuleTarget),
    /// Independent mode: one file.
    File(FileTarget),
}

impl ResolvedTarget {
    /// Returns the execution mode this target is processed in.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        match self {
            Self::Module(_) => ExecutionMode::Dependent,
            Self::File(_) => ExecutionMode::Independent,
        }
    }

    /// Returns the path identifying the target: manifest or file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Module(t) => &t.module.manifest_path,
            Self::File(t) => &t.path,
        }
    }

    /// Returns the module the target belongs to, if any.
    #[must_use]
    pub fn module(&self) -> Option<&Module> {
        match self {
            Self::Module(t) => Some(&t.module),
            Self::File(t) => t.module.as_deref(),
        }
    }
}

/// Resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// How many ancestors to inspect when searching upward for a manifest.
    /// `None` searches up to the filesystem root.
    pub max_depth: Option<usize>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(32),
        }
    }
}

/// Targets and resolution findings for one invocation.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Targets in first-seen order. Module targets are unique per root,
    /// file targets unique per path.
    pub targets: Vec<ResolvedTarget>,
    /// `path-not-found` and `manifest-syntax-error` findings.
    pub findings: Vec<Finding>,
}

impl Resolution {
    /// Iterates over module targets.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleTarget> {
        self.targets.iter().filter_map(|t| match t {
            ResolvedTarget::Module(m) => Some(m),
            ResolvedTarget::File(_) => None,
        })
    }

    /// Iterates over file targets.
    pub fn files(&self) -> impl Iterator<Item = &FileTarget> {
        self.targets.iter().filter_map(|t| match t {
            ResolvedTarget::File(f) => Some(f),
            ResolvedTarget::Module(_) => None,
        })
    }
}

/// Expands raw path arguments into [`ResolvedTarget`]s.
#[derive(Debug, Clone, Default)]
pub struct ModuleResolver {
    options: ResolverOptions,
}

impl ModuleResolver {
    /// Creates a resolver with the given options.
    #[must_use]
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Resolves `paths`.
    ///
    /// Never fails as a whole: a missing path or broken manifest becomes a
    /// finding and only that argument (or module) is skipped.
    pub fn resolve<P: AsRef<Path>>(&self, paths: &[P]) -> Resolution {
        let mut state = ResolveState::new(self.options);
        for raw in paths {
            state.argument(raw.as_ref());
        }
        info!(
            "Resolved {} targets ({} modules)",
            state.out.targets.len(),
            state.module_index.len()
        );
        state.out
    }

    /// Finds the manifest of the module enclosing `path`, searching upward.
    #[must_use]
    pub fn find_enclosing_manifest(&self, path: &Path) -> Option<PathBuf> {
        let start = if path.is_dir() { path } else { path.parent()? };
        let limit = self.options.max_depth.map_or(usize::MAX, |d| d.saturating_add(1));
        start.ancestors().take(limit).find_map(Manifest::find_in)
    }
}

/// Outcome of loading one module, cached per root.
enum Loaded {
    Ok(Arc<Module>),
    Failed,
}

struct ResolveState {
    resolver: ModuleResolver,
    out: Resolution,
    loaded: HashMap<PathBuf, Loaded>,
    module_index: HashMap<PathBuf, usize>,
    seen_files: HashSet<PathBuf>,
}

impl ResolveState {
    fn new(options: ResolverOptions) -> Self {
        Self {
            resolver: ModuleResolver::new(options),
            out: Resolution::default(),
            loaded: HashMap::new(),
            module_index: HashMap::new(),
            seen_files: HashSet::new(),
        }
    }

    fn argument(&mut self, raw: &Path) {
        let path = match std::fs::canonicalize(raw) {
            Ok(path) => path,
            Err(e) => {
                debug!("Cannot resolve {}: {e}", raw.display());
                self.out.findings.push(Finding::new(PATH_NOT_FOUND, raw));
                return;
            }
        };

        if path.is_dir() {
            self.directory(&path);
        } else if Manifest::is_manifest_path(&path) {
            if let Some(module) = self.module(&path) {
                self.request(&module, path.clone());
                self.schedule_files(&module, |_| true);
            }
        } else {
            self.data_file(path);
        }
    }

    fn directory(&mut self, dir: &Path) {
        if let Some(manifest) = Manifest::find_in(dir) {
            if let Some(module) = self.module(&manifest) {
                self.request(&module, manifest);
                self.schedule_files(&module, |_| true);
            }
            return;
        }

        if let Some(manifest) = self.resolver.find_enclosing_manifest(dir) {
            debug!("{} is inside module {}", dir.display(), manifest.display());
            if let Some(module) = self.module(&manifest) {
                self.request(&module, dir.to_path_buf());
                self.schedule_files(&module, |f| f.path.starts_with(dir));
            }
            return;
        }

        let manifests: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {e}", dir.display());
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && Manifest::is_manifest_path(e.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        if manifests.is_empty() {
            debug!("No modules found under {}", dir.display());
        }
        for manifest in manifests {
            // A root holding both manifest names is loaded once, from the
            // preferred name.
            let preferred = manifest
                .parent()
                .and_then(Manifest::find_in)
                .unwrap_or_else(|| manifest.clone());
            if preferred != manifest {
                continue;
            }
            if let Some(module) = self.module(&manifest) {
                self.request(&module, manifest);
                self.schedule_files(&module, |_| true);
            }
        }
    }

    fn data_file(&mut self, path: PathBuf) {
        let Some(file_type) = FileType::from_path(&path) else {
            debug!("Ignoring {}: no rule reads it", path.display());
            return;
        };

        let module = self
            .resolver
            .find_enclosing_manifest(&path)
            .and_then(|manifest| self.module(&manifest));

        let Some(module) = module else {
            self.push_file(FileTarget {
                path,
                file_type,
                module: None,
                section: None,
            });
            return;
        };

        self.request(&module, path.clone());
        let section = match module.file(&path) {
            Some(file) => Some(file.section.clone()),
            None => {
                debug!(
                    "{} is not declared by module {}",
                    path.display(),
                    module.name
                );
                None
            }
        };
        self.push_file(FileTarget {
            path,
            file_type,
            module: Some(module),
            section,
        });
    }

    /// Loads the module declared by `manifest`, once per root.
    fn module(&mut self, manifest: &Path) -> Option<Arc<Module>> {
        let root = manifest.parent()?.to_path_buf();
        if let Some(loaded) = self.loaded.get(&root) {
            return match loaded {
                Loaded::Ok(module) => Some(Arc::clone(module)),
                Loaded::Failed => None,
            };
        }

        match Manifest::load(manifest) {
            Ok(parsed) => {
                let module = Arc::new(Module::from_manifest(&parsed));
                debug!(
                    "Loaded module {} with {} files",
                    module.name,
                    module.files.len()
                );
                if !module.installable {
                    info!("Module {} is not installable, its checks are skipped", module.name);
                }
                self.loaded.insert(root, Loaded::Ok(Arc::clone(&module)));
                self.module_index
                    .insert(module.root.clone(), self.out.targets.len());
                self.out.targets.push(ResolvedTarget::Module(ModuleTarget {
                    module: Arc::clone(&module),
                    requested: BTreeSet::new(),
                }));
                Some(module)
            }
            Err(e) => {
                warn!("{e}");
                self.out.findings.push(manifest_finding(&e));
                self.loaded.insert(root, Loaded::Failed);
                None
            }
        }
    }

    fn request(&mut self, module: &Module, path: PathBuf) {
        let Some(&index) = self.module_index.get(&module.root) else {
            return;
        };
        if let Some(ResolvedTarget::Module(target)) = self.out.targets.get_mut(index) {
            target.requested.insert(path);
        }
    }

    fn schedule_files(&mut self, module: &Arc<Module>, keep: impl Fn(&ModuleFile) -> bool) {
        for file in module.files.iter().filter(|f| keep(f)) {
            self.push_file(FileTarget {
                path: file.path.clone(),
                file_type: file.file_type,
                module: Some(Arc::clone(module)),
                section: Some(file.section.clone()),
            });
        }
    }

    fn push_file(&mut self, target: FileTarget) {
        if self.seen_files.insert(target.path.clone()) {
            self.out.targets.push(ResolvedTarget::File(target));
        }
    }
}

fn manifest_finding(error: &ManifestError) -> Finding {
    let finding = Finding::new(MANIFEST_SYNTAX_ERROR, error.path()).arg(error);
    match error.location() {
        Some(location) => finding.at(location),
        None => finding,
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expands `pattern` relative to `root`, returning normalized file paths in
/// sorted order.
fn glob_under(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let Some(root_str) = root.to_str() else {
        warn!("Cannot expand globs under non UTF-8 path {}", root.display());
        return Vec::new();
    };
    let full = format!("{}/{pattern}", glob::Pattern::escape(root_str));
    let entries = match glob::glob(&full) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Invalid glob pattern {pattern} in {}: {e}", root.display());
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Skipping unreadable glob match: {e}");
                None
            }
        })
        .filter(|p| p.is_file())
        .map(|p| normalize(&p))
        .collect();
    paths.sort();
    paths
}

/// Resolves `.` and `..` components and symlinks where the path exists.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(real) = std::fs::canonicalize(path) {
        return real;
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn module(root: &Path, name: &str, manifest: &str) -> PathBuf {
        write(root, &format!("{name}/__init__.py"), "");
        write(root, &format!("{name}/__manifest__.py"), manifest)
    }

    #[test]
    fn expands_declared_files_and_catalogs() {
        let tmp = TempDir::new().unwrap();
        let manifest = module(
            tmp.path(),
            "mod_a",
            "{'data': ['views/a.xml', 'missing.xml', 'models/a.py'], 'demo': ['demo/*.xml']}",
        );
        write(tmp.path(), "mod_a/views/a.xml", "<odoo/>");
        write(tmp.path(), "mod_a/demo/d1.xml", "<odoo/>");
        write(tmp.path(), "mod_a/demo/d2.xml", "<odoo/>");
        write(tmp.path(), "mod_a/i18n/es.po", "");
        write(tmp.path(), "mod_a/i18n_extra/mod_a.pot", "");
        write(tmp.path(), "mod_a/undeclared.xml", "<odoo/>");

        let parsed = Manifest::load(&fs::canonicalize(manifest).unwrap()).unwrap();
        let module = Module::from_manifest(&parsed);

        let shorts: Vec<_> = module
            .files
            .iter()
            .map(|f| (f.short.to_string_lossy().into_owned(), f.section.as_str()))
            .collect();
        assert_eq!(
            shorts,
            vec![
                ("views/a.xml".to_string(), "data"),
                ("demo/d1.xml".to_string(), "demo"),
                ("demo/d2.xml".to_string(), "demo"),
                ("i18n/es.po".to_string(), "i18n"),
                ("i18n_extra/mod_a.pot".to_string(), "i18n_extra"),
            ]
        );
        assert_eq!(module.name, "mod_a");
        assert_eq!(module.files_of(FileType::Catalog).count(), 2);
    }

    #[test]
    fn data_file_pulls_in_its_module() {
        let tmp = TempDir::new().unwrap();
        module(tmp.path(), "mod_a", "{'data': ['x.xml', 'y.xml']}");
        let x = write(tmp.path(), "mod_a/x.xml", "<odoo/>");
        write(tmp.path(), "mod_a/y.xml", "<odoo/>");

        let resolution = ModuleResolver::default().resolve(&[&x]);
        assert!(resolution.findings.is_empty());

        let modules: Vec<_> = resolution.modules().collect();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].module.files.len(), 2);
        assert_eq!(
            modules[0].requested,
            BTreeSet::from([fs::canonicalize(&x).unwrap()])
        );

        let files: Vec<_> = resolution.files().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].section.as_deref(), Some("data"));
    }

    #[test]
    fn same_module_from_two_arguments_is_resolved_once() {
        let tmp = TempDir::new().unwrap();
        let manifest = module(tmp.path(), "mod_a", "{'data': ['x.xml', 'y.xml']}");
        let x = write(tmp.path(), "mod_a/x.xml", "<odoo/>");
        let y = write(tmp.path(), "mod_a/y.xml", "<odoo/>");

        let resolution = ModuleResolver::default().resolve(&[x, y, manifest]);
        let modules: Vec<_> = resolution.modules().collect();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].requested.len(), 3);
        assert_eq!(resolution.files().count(), 2);
    }

    #[test]
    fn missing_path_and_broken_manifest_do_not_stop_siblings() {
        let tmp = TempDir::new().unwrap();
        module(tmp.path(), "broken", "{'data': [");
        let good = module(tmp.path(), "good", "{'data': []}");

        let resolution = ModuleResolver::default().resolve(&[
            tmp.path().join("nope"),
            tmp.path().join("broken"),
            good,
        ]);

        let rules: Vec<_> = resolution.findings.iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(rules, vec![PATH_NOT_FOUND, MANIFEST_SYNTAX_ERROR]);
        assert_eq!(resolution.modules().count(), 1);
    }

    #[test]
    fn missing_init_is_a_manifest_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "mod_a/__manifest__.py", "{}");

        let resolution = ModuleResolver::default().resolve(&[tmp.path().join("mod_a")]);
        assert_eq!(resolution.findings.len(), 1);
        assert_eq!(resolution.findings[0].rule, MANIFEST_SYNTAX_ERROR);
        assert!(resolution.targets.is_empty());
    }

    #[test]
    fn plain_directory_is_searched_downward() {
        let tmp = TempDir::new().unwrap();
        module(tmp.path(), "mod_a", "{}");
        module(tmp.path(), "nested/mod_b", "{}");
        module(tmp.path(), ".hidden/mod_c", "{}");

        let resolution = ModuleResolver::default().resolve(&[tmp.path()]);
        let mut names: Vec<_> = resolution
            .modules()
            .map(|m| m.module.name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["mod_a", "mod_b"]);
    }

    #[test]
    fn loose_file_has_no_module() {
        let tmp = TempDir::new().unwrap();
        let loose = write(tmp.path(), "loose.xml", "<odoo/>");
        write(tmp.path(), "notes.txt", "");

        let resolution =
            ModuleResolver::default().resolve(&[loose, tmp.path().join("notes.txt")]);
        let files: Vec<_> = resolution.files().collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].module.is_none());
        assert_eq!(resolution.modules().count(), 0);
    }

    #[test]
    fn upward_search_respects_max_depth() {
        let tmp = TempDir::new().unwrap();
        module(tmp.path(), "mod_a", "{}");
        let deep = write(tmp.path(), "mod_a/a/b/c/deep.xml", "<odoo/>");

        let shallow = ModuleResolver::new(ResolverOptions { max_depth: Some(1) });
        assert!(shallow.find_enclosing_manifest(&deep).is_none());
        assert!(ModuleResolver::default()
            .find_enclosing_manifest(&deep)
            .is_some());
    }
}
