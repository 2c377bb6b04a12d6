//! Provider CLI discovery

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::request::Provider;

/// How the host application is packaged; affects where bundled CLIs live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingMode {
    Development,
    Installed,
}

/// A runnable CLI: a direct executable or an interpreter+script pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,

    /// Arguments always passed first (the script path for interpreter pairs)
    pub leading_args: Vec<String>,
}

impl Invocation {
    pub fn direct(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn scripted(interpreter: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            program: interpreter.into(),
            leading_args: vec![script.into()],
        }
    }

    fn exists(&self) -> bool {
        match self.leading_args.first() {
            // Interpreter pairs are checked by their script; the
            // interpreter itself resolves from PATH at spawn time.
            Some(script) => Path::new(script).is_file(),
            None => self.program.is_file(),
        }
    }
}

/// Resolves provider CLI executables from an ordered candidate list.
/// The first existing candidate wins; a PATH scan is the last resort.
#[derive(Debug, Clone)]
pub struct CliLocator {
    mode: PackagingMode,

    /// Base directory for bundled binaries in installed mode
    resources_dir: PathBuf,

    search_path: bool,
}

impl CliLocator {
    pub fn new(mode: PackagingMode) -> Self {
        Self {
            mode,
            resources_dir: PathBuf::from("/usr/local/lib/shipwright/bin"),
            search_path: true,
        }
    }

    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = dir.into();
        self
    }

    /// Skip the PATH scan fallback; used by tests that need hermetic lookup
    pub fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    pub fn locate(&self, provider: Provider) -> Option<Invocation> {
        let found = self
            .candidates(provider)
            .into_iter()
            .find(Invocation::exists)
            .or_else(|| {
                if self.search_path {
                    find_in_path(provider.cli_name()).map(Invocation::direct)
                } else {
                    None
                }
            })?;

        debug!("Resolved {} CLI at {}", provider, found.program.display());
        if provider == Provider::Railway && found.leading_args.is_empty() {
            // The bundled Railway binary sometimes loses its executable
            // bit when unpacked; fix it once and move on.
            ensure_executable(&found.program);
        }
        Some(found)
    }

    fn candidates(&self, provider: Provider) -> Vec<Invocation> {
        let mut list = Vec::new();
        if self.mode == PackagingMode::Installed {
            list.push(Invocation::direct(
                self.resources_dir.join(provider.cli_name()),
            ));
        }
        match provider {
            Provider::Netlify => {
                list.push(Invocation::direct("node_modules/.bin/netlify"));
                list.push(Invocation::scripted(
                    "node",
                    "node_modules/netlify-cli/bin/run.js",
                ));
            }
            Provider::Railway => {
                if let Some(home) = std::env::var_os("HOME") {
                    list.push(Invocation::direct(
                        PathBuf::from(home).join(".railway/bin/railway"),
                    ));
                }
                list.push(Invocation::direct("/usr/local/bin/railway"));
            }
        }
        list
    }
}

/// Set the executable bit when it is missing. Failure is logged, not
/// fatal; the deploy may still fail later at spawn time.
fn ensure_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(meta) => {
                let mode = meta.permissions().mode();
                if mode & 0o111 == 0 {
                    let mut perms = meta.permissions();
                    perms.set_mode(mode | 0o755);
                    if let Err(e) = std::fs::set_permissions(path, perms) {
                        warn!("Failed to mark {} executable: {}", path.display(), e);
                    }
                }
            }
            Err(e) => warn!("Failed to stat {}: {}", path.display(), e),
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
