//! The native toolchain boundary.
//!
//! The bridge consumes the toolchain as a black box: given an artifact
//! identifier, produce a loadable module or report why it could not be
//! built. Failure is always a normal [`BuildFailure`] value — a toolchain
//! implementation must never terminate the process to signal a compile
//! error, because the group's failure propagation depends on observing it.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use crate::preamble::BuildConfig;
use crate::search_path::{self, SearchPath};
use crate::stage::STAGED_EXT;

/// A toolchain compilation failure, with the toolchain's message embedded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BuildFailure {
    /// The toolchain's failure description.
    pub message: String,
}

impl BuildFailure {
    /// Creates a build failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A loadable native module handle.
///
/// `name` equals the artifact identifier, which is also the symbol the
/// staged source registered itself under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeModule {
    name: String,
    path: PathBuf,
}

impl NativeModule {
    /// Creates a module handle.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// The registered module name (the artifact identifier).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem location of the built shared object.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A native build/import step for staged artifacts.
pub trait Toolchain {
    /// Builds (or cache-hits) the artifact and returns its module handle.
    fn compile_and_load(&self, artifact_id: &str) -> Result<NativeModule, BuildFailure>;
}

/// Toolchain backed by the system C++ compiler.
///
/// Resolves `<artifact_id>.cpp` on the module search path. When the shared
/// object next to it is already up to date the compiler is not invoked at
/// all (the cache-hit path); otherwise the build descriptor is recovered
/// from the staged source and `$CXX` (or `c++`) is run with it. A non-zero
/// exit becomes a [`BuildFailure`] carrying the compiler's stderr.
pub struct SystemToolchain<'a> {
    search: &'a SearchPath,
}

impl SystemToolchain<'static> {
    /// Creates a toolchain resolving against the process-wide search path.
    pub fn new() -> Self {
        Self {
            search: search_path::global(),
        }
    }
}

impl Default for SystemToolchain<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SystemToolchain<'a> {
    /// Creates a toolchain resolving against a specific search path.
    pub fn with_search_path(search: &'a SearchPath) -> Self {
        Self { search }
    }

    fn locate_staged(&self, artifact_id: &str) -> Result<PathBuf, BuildFailure> {
        for dir in self.search.entries() {
            let candidate = dir.join(format!("{artifact_id}.{STAGED_EXT}"));
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(BuildFailure::new(format!(
            "staged source for `{artifact_id}` not found on the module search path"
        )))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether the built shared object is at least as new as the staged source
/// and every declared dependency.
fn is_fresh(shared_object: &Path, staged: &Path, dependencies: &[String]) -> bool {
    let Some(built) = modified(shared_object) else {
        return false;
    };
    let mut inputs = std::iter::once(staged.to_path_buf())
        .chain(dependencies.iter().map(PathBuf::from));
    inputs.all(|input| match modified(&input) {
        Some(at) => at <= built,
        None => false,
    })
}

impl Toolchain for SystemToolchain<'_> {
    fn compile_and_load(&self, artifact_id: &str) -> Result<NativeModule, BuildFailure> {
        let staged = self.locate_staged(artifact_id)?;
        let shared_object = staged.with_extension("so");

        let source = std::fs::read_to_string(&staged).map_err(|e| {
            BuildFailure::new(format!("failed to read staged source {}: {e}", staged.display()))
        })?;
        let config = BuildConfig::extract(&source).map_err(|e| BuildFailure::new(e.to_string()))?;

        if is_fresh(&shared_object, &staged, &config.dependencies) {
            log::debug!("cache hit for {artifact_id}");
            return Ok(NativeModule::new(artifact_id, shared_object));
        }

        let cxx = std::env::var("CXX").unwrap_or_else(|_| "c++".to_string());
        let mut command = Command::new(&cxx);
        command.arg("-shared").arg("-fPIC");
        for dir in &config.include_dirs {
            command.arg(format!("-I{dir}"));
        }
        for arg in &config.compiler_args {
            command.arg(arg);
        }
        command.arg(&staged);
        for extra in &config.sources {
            command.arg(extra);
        }
        for dir in &config.library_dirs {
            command.arg(format!("-L{dir}"));
        }
        for lib in &config.libraries {
            command.arg(format!("-l{lib}"));
        }
        for arg in &config.linker_args {
            command.arg(arg);
        }
        command.arg("-o").arg(&shared_object);

        log::debug!("building {artifact_id}: {command:?}");
        let output = command
            .output()
            .map_err(|e| BuildFailure::new(format!("failed to launch `{cxx}`: {e}")))?;
        if !output.status.success() {
            return Err(BuildFailure::new(format!(
                "`{cxx}` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(NativeModule::new(artifact_id, shared_object))
    }
}
