//! Fault-tolerant loading of many files at once.
//!
//! A failing file never aborts its siblings: the error is recorded against
//! the path and the batch moves on. Nothing is retried.

use std::fs;
use std::path::{Path, PathBuf};

use veles_archive::Archive;
use veles_esp::{Plugin, PluginRegistry};
use veles_papyrus::GameFamily;

use crate::error::Error;

/// One file that failed to load.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: Error,
}

/// The outcome of loading a set of files.
#[derive(Debug)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub failures: Vec<Failure>,
}

impl<T> Batch<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn push(&mut self, path: &Path, result: Result<T, Error>) {
        match result {
            Ok(item) => self.items.push(item),
            Err(error) => self.failures.push(Failure {
                path: path.to_owned(),
                error,
            }),
        }
    }

    /// True when every file loaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Open every archive in `paths`, collecting per-path failures.
pub fn open_archives<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Batch<Archive> {
    let mut batch = Batch::new();
    for path in paths {
        let path = path.as_ref();
        batch.push(path, Archive::open(path).map_err(Error::from));
    }
    batch
}

/// Parse every plugin in `paths` against an already-populated registry.
///
/// Each plugin's registry name is its filename; plugins whose names were
/// never registered fail individually like any other error.
pub fn load_plugins<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
    plugins: &PluginRegistry,
    family: GameFamily,
) -> Batch<Plugin> {
    let mut batch = Batch::new();
    for path in paths {
        let path = path.as_ref();
        batch.push(path, load_plugin(path, plugins, family));
    }
    batch
}

fn load_plugin(
    path: &Path,
    plugins: &PluginRegistry,
    family: GameFamily,
) -> Result<Plugin, Error> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = fs::read(path)?;
    Ok(Plugin::parse(&bytes, &name, plugins, family)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_collected_not_fatal() {
        let batch = open_archives(["/nonexistent/a.bsa", "/nonexistent/b.ba2"]);
        assert!(batch.items.is_empty());
        assert_eq!(batch.failures.len(), 2);
        assert!(!batch.is_complete());
        assert_eq!(batch.failures[0].path, Path::new("/nonexistent/a.bsa"));
    }

    #[test]
    fn plugin_batch_keeps_going_past_failures() {
        let plugins = PluginRegistry::new();
        let batch = load_plugins(
            ["/nonexistent/a.esp", "/nonexistent/b.esp"],
            &plugins,
            GameFamily::Skyrim,
        );
        assert_eq!(batch.failures.len(), 2);
    }

    #[test]
    fn empty_batch_is_complete() {
        let batch = open_archives(Vec::<&str>::new());
        assert!(batch.is_complete());
    }
}
