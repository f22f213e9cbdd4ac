//! Script cache
//!
//! Memoizes parsed files by canonical path with per-key single-flight
//! semantics: the first caller parses, every later caller (including
//! recursive inclusion chains) shares the cached unit. Entries are immutable
//! once inserted and invalidated only by an explicit [`clear`].
//!
//! An inclusion chain that re-enters a path already being parsed on the same
//! thread is an include cycle and is rejected.
//!
//! [`clear`]: ScriptCache::clear

use crate::script::parser::{self, ParsedUnit};
use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::ThreadId;

#[derive(Default)]
struct CacheState {
    entries: HashMap<PathBuf, Arc<ParsedUnit>>,
    in_flight: HashMap<PathBuf, ThreadId>,
}

/// Canonical-path keyed cache of parsed script units.
#[derive(Default)]
pub struct ScriptCache {
    state: Mutex<CacheState>,
    parsed: Condvar,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the parsed unit for `path`, parsing it at most once.
    ///
    /// Concurrent callers for the same path wait for the in-flight parse;
    /// a same-thread re-entry (a file including itself, directly or
    /// transitively) fails with [`Error::InvalidFileFormat`].
    pub fn get_or_parse(&self, path: &Path) -> Result<Arc<ParsedUnit>> {
        let canonical = path
            .canonicalize()
            .map_err(|source| Error::ResourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        {
            let mut state = self.state.lock();
            loop {
                if let Some(unit) = state.entries.get(&canonical) {
                    tracing::trace!(path = %canonical.display(), "cache hit");
                    return Ok(Arc::clone(unit));
                }
                match state.in_flight.get(&canonical) {
                    Some(owner) if *owner == std::thread::current().id() => {
                        return Err(Error::InvalidFileFormat(format!(
                            "include cycle involving {}",
                            canonical.display()
                        )));
                    }
                    Some(_) => {
                        // Another thread is parsing this path; wait for it.
                        self.parsed.wait(&mut state);
                    }
                    None => {
                        state
                            .in_flight
                            .insert(canonical.clone(), std::thread::current().id());
                        break;
                    }
                }
            }
        }

        let result = parser::parse_path(&canonical, self);

        let mut state = self.state.lock();
        state.in_flight.remove(&canonical);
        let result = result.map(|unit| {
            let unit = Arc::new(unit);
            state.entries.insert(canonical.clone(), Arc::clone(&unit));
            unit
        });
        self.parsed.notify_all();
        result
    }

    /// Drop every cached unit. Call when underlying files may have changed
    /// on disk; the cache does no filesystem watching of its own.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Number of cached units.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create script");
        file.write_all(contents.as_bytes()).expect("write script");
        path
    }

    #[test]
    fn test_parse_through_cache() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "a.tas", "!FORMAT: <KA>\nA\n.\n");
        let cache = ScriptCache::new();

        let unit = cache.get_or_parse(&path).unwrap();
        assert_eq!(unit.instructions.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_second_parse_is_shared() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "a.tas", "!FORMAT: <KA>\nA\n");
        let cache = ScriptCache::new();

        let first = cache.get_or_parse(&path).unwrap();

        // Rewrite the file; the cache must keep serving the first parse
        // until cleared, proving the read happened exactly once.
        write_script(&dir, "a.tas", "!FORMAT: <KA>\nA\nA\nA\n");
        let second = cache.get_or_parse(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.instructions.len(), 1);
    }

    #[test]
    fn test_clear_forces_reparse() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "a.tas", "!FORMAT: <KA>\nA\n");
        let cache = ScriptCache::new();

        cache.get_or_parse(&path).unwrap();
        write_script(&dir, "a.tas", "!FORMAT: <KA>\nA\nA\nA\n");
        cache.clear();
        assert!(cache.is_empty());

        let unit = cache.get_or_parse(&path).unwrap();
        assert_eq!(unit.instructions.len(), 3);
    }

    #[test]
    fn test_include_splices_and_is_cached_once() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "sub.tas", "!FORMAT: <K1>\nX\n");
        let root = write_script(
            &dir,
            "root.tas",
            "!TYPE: DEFAULT\n!FORMAT: <K1>\nINCLUDE sub.tas\nINCLUDE sub.tas\n",
        );
        let cache = ScriptCache::new();

        let unit = cache.get_or_parse(&root).unwrap();
        assert_eq!(unit.instructions.len(), 2);
        // root + sub, sub cached once despite two inclusion sites
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_missing_file_is_resource_unavailable() {
        let dir = TempDir::new().unwrap();
        let cache = ScriptCache::new();
        let err = cache.get_or_parse(&dir.path().join("absent.tas")).unwrap_err();
        assert!(matches!(err, Error::ResourceUnavailable { .. }));
    }

    #[test]
    fn test_missing_include_target_fails_parent() {
        let dir = TempDir::new().unwrap();
        let root = write_script(
            &dir,
            "root.tas",
            "!TYPE: DEFAULT\n!FORMAT: <K1>\nINCLUDE nope.tas\n",
        );
        let cache = ScriptCache::new();
        let err = cache.get_or_parse(&root).unwrap_err();
        assert!(matches!(err, Error::ResourceUnavailable { .. }));
        // The failed parse is not cached
        assert!(cache.is_empty());
    }

    #[test]
    fn test_self_include_cycle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "loop.tas", "!FORMAT: <K1>\nINCLUDE loop.tas\n");
        let cache = ScriptCache::new();

        let err = cache.get_or_parse(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFileFormat(_)));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_mutual_include_cycle_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "a.tas", "!FORMAT: <K1>\nINCLUDE b.tas\n");
        let a = dir.path().join("a.tas");
        write_script(&dir, "b.tas", "!FORMAT: <K1>\nINCLUDE a.tas\n");
        let cache = ScriptCache::new();

        let err = cache.get_or_parse(&a).unwrap_err();
        assert!(matches!(err, Error::InvalidFileFormat(_)));
    }

    #[test]
    fn test_nested_include_chain() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "leaf.tas", "!FORMAT: <K1>\nX\nX\n");
        write_script(&dir, "mid.tas", "!FORMAT: <K1>\nINCLUDE leaf.tas\nX\n");
        let root = write_script(
            &dir,
            "root.tas",
            "!TYPE: DEFAULT\n!FORMAT: <K1>\nINCLUDE mid.tas\n",
        );
        let cache = ScriptCache::new();

        let unit = cache.get_or_parse(&root).unwrap();
        assert_eq!(unit.instructions.len(), 3);
        assert_eq!(cache.len(), 3);
    }
}
