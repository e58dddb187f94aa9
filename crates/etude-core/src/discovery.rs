//! Startup-time resolver discovery.
//!
//! Discovery walks a source tree, keeps the files matching the unit naming
//! convention, loads each one through a [`UnitLoader`] and registers every
//! resolver it yields.
//!
//! Rust cannot load source files at runtime, so a unit is linked at compile
//! time instead: `#[resolvers]` on an impl block (a resolver group) or
//! `export_resolvers!` over free functions submits a [`LinkedUnit`] tagged
//! with its own `file!()` path and crate directory. [`UnitCatalog::linked`]
//! collects them, and loading a discovered path means finding the linked
//! unit compiled from that very file.
//!
//! ```rust,ignore
//! let registry = Discovery::linked("src/resolvers").discover().await?;
//! ```
//!
//! Any failure is fatal: a missing root, an unreadable entry, a matching
//! file with no linked unit, a failing loader or a duplicate name.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::DiscoveryError;
use crate::naming;
use crate::registry::HandlerRegistry;
use crate::resolver::Resolver;

/// Error a unit loader may fail with.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a unit's load function.
pub type UnitFuture = Pin<Box<dyn Future<Output = Result<LoadedUnit, LoadError>> + Send>>;

/// Box a load future.
pub fn unit_future<F>(fut: F) -> UnitFuture
where
    F: Future<Output = Result<LoadedUnit, LoadError>> + Send + 'static,
{
    Box::pin(fut)
}

/// A group of resolvers sharing one instance.
///
/// Implemented by `#[resolvers]`; each public `&self` method other than the
/// constructor becomes a resolver holding a clone of the same `Arc`.
pub trait ResolverGroup: Send + Sync + 'static {
    fn resolvers(self: Arc<Self>) -> Vec<Resolver>;
}

/// What loading a unit produced.
#[derive(Debug)]
pub enum LoadedUnit {
    /// Methods of one instantiated group.
    Group(Vec<Resolver>),
    /// Independently exported functions.
    Exports(Vec<Resolver>),
}

impl LoadedUnit {
    /// Instantiate-once helper: binds every group method to one shared instance.
    pub fn group<G: ResolverGroup>(group: G) -> Self {
        LoadedUnit::Group(Arc::new(group).resolvers())
    }

    pub fn exports(resolvers: Vec<Resolver>) -> Self {
        LoadedUnit::Exports(resolvers)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LoadedUnit::Group(_) => "group",
            LoadedUnit::Exports(_) => "exports",
        }
    }

    pub fn into_resolvers(self) -> Vec<Resolver> {
        match self {
            LoadedUnit::Group(r) | LoadedUnit::Exports(r) => r,
        }
    }
}

/// Compile-time registration of a resolver unit.
///
/// Submitted by the `#[resolvers]` and `export_resolvers!` macros; not
/// usually constructed by hand.
pub struct LinkedUnit {
    source: &'static str,
    manifest_dir: &'static str,
    module: &'static str,
    load: fn() -> UnitFuture,
}

impl LinkedUnit {
    pub const fn new(
        source: &'static str,
        manifest_dir: &'static str,
        module: &'static str,
        load: fn() -> UnitFuture,
    ) -> Self {
        Self {
            source,
            manifest_dir,
            module,
            load,
        }
    }

    /// Source file the unit was compiled from, as reported by `file!()`.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// `CARGO_MANIFEST_DIR` of the crate the unit was compiled in.
    pub fn manifest_dir(&self) -> &'static str {
        self.manifest_dir
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Canonical on-disk path of the unit's source file.
    ///
    /// `file!()` is relative to the directory cargo invoked rustc from, the
    /// package or the workspace root, so it is resolved against the first
    /// ancestor of the manifest directory that contains it.
    pub fn locate(&self) -> Option<PathBuf> {
        let source = Path::new(self.source);
        if source.is_absolute() {
            return fs::canonicalize(source).ok();
        }
        Path::new(self.manifest_dir)
            .ancestors()
            .map(|dir| dir.join(source))
            .find(|candidate| candidate.is_file())
            .and_then(|found| fs::canonicalize(found).ok())
    }
}

inventory::collect!(LinkedUnit);

/// Loads a discovered unit into resolvers.
#[async_trait]
pub trait UnitLoader: Send + Sync {
    /// `unit` is the path of the unit relative to the discovery `root`.
    async fn load_unit(&self, root: &Path, unit: &Path) -> Result<LoadedUnit, DiscoveryError>;
}

type LoadFn = Arc<dyn Fn() -> UnitFuture + Send + Sync>;

/// Which walked files a catalog entry answers for.
enum SourceMatch {
    /// Only the file at this canonical path.
    Exact(PathBuf),
    /// Any walked unit this relative path ends with.
    Suffix(PathBuf),
    /// A unit whose source file is not on disk; matches nothing.
    Missing,
}

struct CatalogEntry {
    source: SourceMatch,
    load: LoadFn,
}

/// Loader resolving unit paths against known source paths.
///
/// Linked units and entries added with an absolute path match only the
/// walked file that is the same file on disk. Entries added with a relative
/// path match any walked unit they end with, component-wise.
#[derive(Default)]
pub struct UnitCatalog {
    entries: Vec<CatalogEntry>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of every unit linked into the running binary.
    pub fn linked() -> Self {
        let mut catalog = Self::new();
        for unit in inventory::iter::<LinkedUnit> {
            let load = unit.load;
            let source = match unit.locate() {
                Some(path) => SourceMatch::Exact(path),
                None => {
                    tracing::warn!(
                        source = unit.source,
                        module = unit.module,
                        "linked resolver unit source not found on disk"
                    );
                    SourceMatch::Missing
                }
            };
            tracing::trace!(source = unit.source, module = unit.module, "found linked resolver unit");
            catalog.entries.push(CatalogEntry {
                source,
                load: Arc::new(move || load()),
            });
        }
        catalog
    }

    /// Add a unit by source path.
    pub fn unit<F>(mut self, source: impl Into<PathBuf>, load: F) -> Self
    where
        F: Fn() -> UnitFuture + Send + Sync + 'static,
    {
        let source = source.into();
        let source = if source.is_absolute() {
            fs::canonicalize(&source).map_or(SourceMatch::Missing, SourceMatch::Exact)
        } else {
            SourceMatch::Suffix(source)
        };
        self.entries.push(CatalogEntry {
            source,
            load: Arc::new(load),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, root: &Path, unit: &Path) -> Result<&CatalogEntry, DiscoveryError> {
        let walked = fs::canonicalize(root.join(unit)).ok();
        let mut matches = self.entries.iter().filter(|e| match &e.source {
            SourceMatch::Exact(path) => walked.as_deref() == Some(path.as_path()),
            SourceMatch::Suffix(path) => path.ends_with(unit),
            SourceMatch::Missing => false,
        });
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry),
            (None, _) => Err(DiscoveryError::UnlinkedUnit(unit.to_path_buf())),
            (Some(_), Some(_)) => Err(DiscoveryError::AmbiguousUnit(unit.to_path_buf())),
        }
    }
}

#[async_trait]
impl UnitLoader for UnitCatalog {
    async fn load_unit(&self, root: &Path, unit: &Path) -> Result<LoadedUnit, DiscoveryError> {
        let entry = self.resolve(root, unit)?;
        (entry.load)().await.map_err(|e| DiscoveryError::Load {
            unit: unit.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Walk `root` recursively and return the files accepted by `filter`,
/// relative to `root`. Order follows the walk and is not meaningful.
pub fn list_candidate_units(
    root: &Path,
    filter: &dyn Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if filter(relative) {
            units.push(relative.to_path_buf());
        }
    }
    Ok(units)
}

type UnitFilter = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Discovers resolver units under a root directory.
pub struct Discovery {
    root: PathBuf,
    filter: UnitFilter,
    loader: Arc<dyn UnitLoader>,
}

impl Discovery {
    pub fn new(root: impl Into<PathBuf>, loader: impl UnitLoader + 'static) -> Self {
        Self {
            root: root.into(),
            filter: Box::new(naming::is_resolver_unit),
            loader: Arc::new(loader),
        }
    }

    /// Discovery backed by the units linked into this binary.
    pub fn linked(root: impl Into<PathBuf>) -> Self {
        Self::new(root, UnitCatalog::linked())
    }

    /// Replace the naming-convention predicate.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.filter = Box::new(filter);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run discovery into a fresh registry.
    ///
    /// The registry is only returned once every unit loaded and registered,
    /// so a partial registry is never observable.
    pub async fn discover(&self) -> Result<HandlerRegistry, DiscoveryError> {
        let mut registry = HandlerRegistry::new();
        self.discover_into(&mut registry).await?;
        Ok(registry)
    }

    /// Run discovery into an existing registry, returning how many resolvers
    /// were added. On error the registry may hold some of the units; callers
    /// are expected to abort.
    pub async fn discover_into(&self, registry: &mut HandlerRegistry) -> Result<usize, DiscoveryError> {
        let units = list_candidate_units(&self.root, &*self.filter)?;
        tracing::debug!(root = %self.root.display(), units = units.len(), "discovered resolver units");

        let mut added = 0;
        for unit in &units {
            let loaded = self.loader.load_unit(&self.root, unit).await?;
            let kind = loaded.kind();
            let resolvers = loaded.into_resolvers();
            tracing::debug!(unit = %unit.display(), kind, resolvers = resolvers.len(), "loaded resolver unit");

            for resolver in resolvers {
                registry
                    .register(resolver)
                    .map_err(|e| DiscoveryError::from_register(e, unit))?;
                added += 1;
            }
        }

        tracing::info!(root = %self.root.display(), units = units.len(), resolvers = added, "resolver discovery complete");
        Ok(added)
    }
}
