use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("empty command")]
    Empty,
    #[error("'{0}' is a relative path; use a bare command name or an absolute path")]
    RelativePath(String),
    #[error("could not find executable '{command}': {source}")]
    NotFound {
        command: String,
        #[source]
        source: which::Error,
    },
}

/// Maps a profile's `command` to the program that gets spawned.
pub trait ExecutableResolver: Send + Sync {
    fn resolve(&self, command: &str) -> Result<PathBuf, ResolveError>;
}

/// Absolute paths must name an executable file; bare names are looked up on
/// the search path. Relative paths with separators are rejected.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    search_path: Option<OsString>,
}

impl PathResolver {
    /// Resolve against `$PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve against a fixed search path instead of `$PATH`.
    pub fn with_search_path(paths: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(paths.into()),
        }
    }
}

impl ExecutableResolver for PathResolver {
    fn resolve(&self, command: &str) -> Result<PathBuf, ResolveError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(ResolveError::Empty);
        }
        let not_found = |source| ResolveError::NotFound {
            command: command.to_string(),
            source,
        };

        let path = Path::new(command);
        if path.is_absolute() {
            return which::which(path).map_err(not_found);
        }
        let mut components = path.components();
        let bare = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !bare {
            return Err(ResolveError::RelativePath(command.to_string()));
        }

        match &self.search_path {
            Some(paths) => which::which_in(command, Some(paths), Path::new("/")).map_err(not_found),
            None => which::which(command).map_err(not_found),
        }
    }
}
