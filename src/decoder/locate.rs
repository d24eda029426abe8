//! Finding the decoder executable
//!
//! Resolution order, first hit wins:
//!
//! 1. explicit override path from the config
//! 2. the search path (`PATH`)
//! 3. `<prefix>/bin/<name>`, where the prefix comes from a package manager
//!    command such as `brew --prefix`
//! 4. well-known install directories, then configured extra directories
//!
//! The resolved path is cached; a cached path that vanished is dropped and
//! resolution simply runs again.

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::RwLock;

/// Directories probed when PATH and the package manager come up empty
pub const WELL_KNOWN_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

#[derive(Debug)]
pub struct BinaryLocator {
    program: String,
    override_path: Option<PathBuf>,
    search_path: Option<OsString>,
    prefix_command: Vec<String>,
    fallback_dirs: Vec<PathBuf>,
    cached: RwLock<Option<PathBuf>>,
}

impl BinaryLocator {
    /// Locator for `program` using the process environment and default directories
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            override_path: None,
            search_path: std::env::var_os("PATH"),
            prefix_command: Vec::new(),
            fallback_dirs: WELL_KNOWN_DIRS.iter().map(PathBuf::from).collect(),
            cached: RwLock::new(None),
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        let mut locator = Self::new(&config.binary)
            .with_prefix_command(config.prefix_command.clone());
        locator.override_path = config.override_path.clone();
        locator.fallback_dirs.extend(config.search_dirs.iter().cloned());
        locator
    }

    /// Replace the search path (PATH-style list); `None` disables step 2
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_prefix_command(mut self, command: Vec<String>) -> Self {
        self.prefix_command = command;
        self
    }

    pub fn with_fallback_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.fallback_dirs = dirs;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the executable, using the cache when it is still valid
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Ok(guard) = self.cached.read() {
            if let Some(path) = guard.as_ref() {
                if is_executable(path) {
                    return Ok(path.clone());
                }
            }
        }

        self.invalidate();
        let path = self.search()?;
        tracing::debug!("Resolved {} to {}", self.program, path.display());

        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(path.clone());
        }
        Ok(path)
    }

    /// Forget the cached path
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = None;
        }
    }

    fn search(&self) -> Result<PathBuf> {
        let mut searched = Vec::new();

        if let Some(path) = &self.override_path {
            if is_executable(path) {
                return Ok(path.clone());
            }
            searched.push(path.clone());
        }

        if let Some(search_path) = &self.search_path {
            for dir in std::env::split_paths(search_path) {
                for candidate in self.candidates_in(&dir) {
                    if is_executable(&candidate) {
                        return Ok(candidate);
                    }
                }
                searched.push(dir);
            }
        }

        if let Some(prefix) = self.package_prefix() {
            let candidate = prefix.join("bin").join(&self.program);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        for dir in &self.fallback_dirs {
            let candidate = dir.join(&self.program);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        Err(Error::DecoderNotFound {
            decoder: self.program.clone(),
            searched,
        })
    }

    fn candidates_in(&self, dir: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![dir.join(&self.program)];
        if cfg!(windows) && Path::new(&self.program).extension().is_none() {
            candidates.push(dir.join(format!("{}.exe", self.program)));
        }
        candidates
    }

    /// Ask the package manager for its install prefix; any failure means "none"
    fn package_prefix(&self) -> Option<PathBuf> {
        let (cmd, args) = self.prefix_command.split_first()?;
        let output = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let prefix = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if prefix.is_empty() {
            None
        } else {
            Some(PathBuf::from(prefix))
        }
    }
}

/// A regular file the current user could execute
fn is_executable(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => has_exec_bit(&meta),
        _ => false,
    }
}

#[cfg(unix)]
fn has_exec_bit(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_meta: &std::fs::Metadata) -> bool {
    true
}
