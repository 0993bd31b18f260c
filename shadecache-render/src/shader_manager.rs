//! Shader program cache with on-disk staleness detection.
//!
//! Programs are keyed by [`ShaderKey`] (name plus ordered defines) and built
//! on first request from `<root>/<name>.vert`, `<root>/<name>.frag` and, when
//! present, `<root>/<name>.geom`.
//!
//! ## Entry lifecycle
//!
//! | State   | Meaning                                    |
//! |---------|--------------------------------------------|
//! | Absent  | no entry; next lookup builds               |
//! | Loading | inside [`ShaderManager::load_resource_by_key`] |
//! | Ready   | cached program, served on every hit        |
//!
//! A failed build leaves the key Absent. With auto-reload on, a lookup first
//! compares the modification time of every file that went into the cached
//! build (including includes) against the time recorded when it was built,
//! and evicts the entry if any file is newer or gone.
//!
//! The manager is single-owner (`&mut self`); share it across threads as
//! [`SharedShaderManager`] so concurrent misses on one key build once.

use crate::backend::{ShaderStage, SharedBackend};
use crate::error::Result;
use crate::preprocessor::Preprocessor;
use crate::shader_key::ShaderKey;
use crate::shader_program::{ShaderProgram, SmartShaderProgram};
use crate::shader_unit::ShaderUnit;
use crate::text_utils::{file_modified_time, identity, is_regular_file};
use parking_lot::Mutex;
use shadecache_config::Config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Manager behind a lock, for callers on more than one thread.
pub type SharedShaderManager = Arc<Mutex<ShaderManager>>;

/// One Ready cache slot.
#[derive(Debug)]
pub struct CacheEntry {
    program: SmartShaderProgram,
    /// Modification time of each contributing file at build time.
    mod_times: HashMap<PathBuf, SystemTime>,
}

impl CacheEntry {
    pub fn program(&self) -> &SmartShaderProgram {
        &self.program
    }

    /// Files whose modification invalidates this entry.
    pub fn source_files(&self) -> impl Iterator<Item = &Path> {
        self.mod_times.keys().map(PathBuf::as_path)
    }

    fn is_stale(&self) -> bool {
        self.mod_times.iter().any(|(path, recorded)| {
            match file_modified_time(path) {
                Some(current) => current > *recorded,
                None => true,
            }
        })
    }

    fn depends_on(&self, path: &Path) -> bool {
        let target = identity(path);
        self.mod_times.keys().any(|p| p == path || identity(p) == target)
    }
}

/// Counters for cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that required a build.
    pub misses: u64,
    /// Entries evicted because a source file changed.
    pub reloads: u64,
    /// Builds that failed.
    pub failures: u64,
}

/// Compiles, links and caches shader programs.
pub struct ShaderManager {
    backend: SharedBackend,
    config: Config,
    preprocessor: Preprocessor,
    auto_reload: bool,
    cache: HashMap<ShaderKey, CacheEntry>,
    stats: CacheStats,
}

impl std::fmt::Debug for ShaderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderManager")
            .field("root", &self.preprocessor.root())
            .field("auto_reload", &self.auto_reload)
            .field("entries", &self.cache.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ShaderManager {
    /// Create a manager using the shader root and auto-reload setting from
    /// `config`.
    pub fn new(backend: SharedBackend, config: &Config) -> Self {
        let root = config.shaders_dir();
        log::info!(
            "Shader manager rooted at {} (auto-reload {})",
            root.display(),
            if config.auto_reload_enabled() { "on" } else { "off" }
        );
        Self {
            backend,
            preprocessor: Preprocessor::new(root),
            auto_reload: config.auto_reload_enabled(),
            config: config.clone(),
            cache: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Create a manager for `root` with the build-profile auto-reload default.
    pub fn with_root(backend: SharedBackend, root: impl AsRef<Path>) -> Self {
        let config = Config::new().with_shaders_dir(root.as_ref().to_string_lossy());
        Self::new(backend, &config)
    }

    pub fn wrap_shared(self) -> SharedShaderManager {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> &Path {
        self.preprocessor.root()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn auto_reload(&self) -> bool {
        self.auto_reload
    }

    pub fn set_auto_reload(&mut self, enabled: bool) {
        self.auto_reload = enabled;
    }

    /// Return the program for `key`, building it on a miss.
    ///
    /// A failed build is not cached and not retried; the next call for the
    /// same key tries again from scratch.
    pub fn get_shader(&mut self, key: impl Into<ShaderKey>) -> Result<SmartShaderProgram> {
        let key = key.into();

        if self.auto_reload {
            self.evict_if_stale(&key);
        }

        if let Some(entry) = self.cache.get(&key) {
            self.stats.hits += 1;
            log::trace!("Shader cache hit for {key}");
            return Ok(Arc::clone(&entry.program));
        }

        self.stats.misses += 1;
        self.load_resource_by_key(&key).inspect_err(|e| {
            self.stats.failures += 1;
            log::error!("Failed to build shader {key}: {e}");
        })
    }

    /// Same lookup as [`Self::get_shader`], taking the encoded key string.
    pub fn get_smart_shader(&mut self, key: &str) -> Result<SmartShaderProgram> {
        self.get_shader(ShaderKey::parse(key))
    }

    /// Whether `key` is Ready.
    pub fn has_resource(&self, key: &ShaderKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Build `key` and insert it as Ready.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already Ready. Loading happens at most once per key
    /// until it is invalidated.
    pub fn load_resource_by_key(&mut self, key: &ShaderKey) -> Result<SmartShaderProgram> {
        assert!(!self.has_resource(key), "Shader already loaded: {key}");

        let paths = self.source_file_paths(key.name())?;
        let mut program = ShaderProgram::new(&self.backend, key.to_string());
        let mut mod_times = HashMap::new();

        for path in &paths {
            let (unit, times) = ShaderUnit::compile_from_file(
                &self.backend,
                &self.preprocessor,
                path,
                key.defines(),
            )?;
            program.add_shader(unit);
            mod_times.extend(times);
        }

        program.link()?;

        let program = Arc::new(program);
        log::info!(
            "Built shader {key} from {} stage(s), {} source file(s)",
            paths.len(),
            mod_times.len()
        );
        self.cache.insert(
            key.clone(),
            CacheEntry {
                program: Arc::clone(&program),
                mod_times,
            },
        );
        Ok(program)
    }

    /// Stage source files for `name`: vertex and fragment always, geometry
    /// when the file exists.
    pub fn source_file_paths(&self, name: &str) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(3);
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            paths.push(self.stage_path(name, stage)?);
        }
        let geometry = self.stage_path(name, ShaderStage::Geometry)?;
        if is_regular_file(&geometry) {
            paths.push(geometry);
        }
        Ok(paths)
    }

    fn stage_path(&self, name: &str, stage: ShaderStage) -> Result<PathBuf> {
        let file = format!("{name}.{}", stage.extension());
        Ok(self.config.checked_shader_path(&file)?)
    }

    fn evict_if_stale(&mut self, key: &ShaderKey) {
        let stale = self.cache.get(key).is_some_and(CacheEntry::is_stale);
        if stale {
            log::info!("Shader sources for {key} changed on disk, reloading");
            self.cache.remove(key);
            self.stats.reloads += 1;
        }
    }

    /// Evict `key`. Handles already given out stay valid.
    pub fn invalidate(&mut self, key: &ShaderKey) -> bool {
        let removed = self.cache.remove(key).is_some();
        if removed {
            log::debug!("Invalidated shader {key}");
        }
        removed
    }

    /// Evict every entry built from `path`. Returns how many were evicted.
    pub fn invalidate_file(&mut self, path: &Path) -> usize {
        let before = self.cache.len();
        self.cache.retain(|key, entry| {
            let hit = entry.depends_on(path);
            if hit {
                log::info!("Invalidated shader {key}: {} changed", path.display());
            }
            !hit
        });
        before - self.cache.len()
    }

    /// Evict everything.
    pub fn clear(&mut self) {
        log::debug!("Clearing {} cached shader(s)", self.cache.len());
        self.cache.clear();
    }

    pub fn entry(&self, key: &ShaderKey) -> Option<&CacheEntry> {
        self.cache.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ShaderKey> {
        self.cache.keys()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
