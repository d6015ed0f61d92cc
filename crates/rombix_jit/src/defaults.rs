//! Platform-determined default compiler options.
//!
//! Two default sets exist: a richer one used when the optional host FEM
//! framework (DOLFINx) is installed, and a minimal one otherwise. The bridge
//! itself never needs to know which set it received; both always carry the
//! required `include_dirs` and `output_dir` entries.

use std::path::{Path, PathBuf};

use crate::options::{keys, CompilerOptions};

/// Environment variable pointing at the optional host framework install root.
pub const HOST_FRAMEWORK_ROOT_VAR: &str = "DOLFINX_DIR";

/// Output directory used when the caller does not override `output_dir`.
pub const DEFAULT_OUTPUT_DIR: &str = ".rombix/compiled";

/// Numerical/parallel runtime roots whose `include` directories are appended
/// to every compilation, when present in the environment.
const RUNTIME_ROOT_VARS: &[&str] = &["MPI_HOME", "PETSC_DIR", "SLEPC_DIR"];

/// Determines the platform default compiler options.
///
/// Selects [`defaults_with_host`] when the host framework is installed
/// (detected through [`HOST_FRAMEWORK_ROOT_VAR`]) and [`minimal_defaults`]
/// otherwise.
pub fn determine_default_compiler_options() -> CompilerOptions {
    match host_framework_root() {
        Some(root) => defaults_with_host(&root),
        None => minimal_defaults(),
    }
}

fn host_framework_root() -> Option<PathBuf> {
    std::env::var_os(HOST_FRAMEWORK_ROOT_VAR).map(PathBuf::from)
}

/// The minimal default set used without the host framework.
pub fn minimal_defaults() -> CompilerOptions {
    let mut options = CompilerOptions::new();
    options.set_list(keys::INCLUDE_DIRS, Vec::<String>::new());
    options.set_scalar(keys::OUTPUT_DIR, DEFAULT_OUTPUT_DIR);
    options.set_list(keys::COMPILER_ARGS, ["-std=c++17", "-O2"]);
    options
}

/// The richer default set used when the host framework is installed at `root`.
pub fn defaults_with_host(root: &Path) -> CompilerOptions {
    let mut options = CompilerOptions::new();
    options.set_list(
        keys::INCLUDE_DIRS,
        [root.join("include").to_string_lossy().into_owned()],
    );
    options.set_scalar(keys::OUTPUT_DIR, DEFAULT_OUTPUT_DIR);
    options.set_list(keys::COMPILER_ARGS, ["-std=c++20", "-O2"]);
    options.set_list(keys::LIBRARIES, ["dolfinx"]);
    options.set_list(
        keys::LIBRARY_DIRS,
        [root.join("lib").to_string_lossy().into_owned()],
    );
    options
}

/// Include directories of the numerical/parallel runtimes present in the
/// environment, in the fixed `MPI_HOME`, `PETSC_DIR`, `SLEPC_DIR` order.
pub fn runtime_include_dirs() -> Vec<String> {
    RUNTIME_ROOT_VARS
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|root| PathBuf::from(root).join("include").to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::ENV_LOCK;

    #[test]
    fn minimal_defaults_carry_required_keys() {
        let options = minimal_defaults();
        assert!(options.require_list(keys::INCLUDE_DIRS).is_ok());
        assert_eq!(options.require_scalar(keys::OUTPUT_DIR).unwrap(), DEFAULT_OUTPUT_DIR);
    }

    #[test]
    fn host_defaults_carry_required_keys_and_host_paths() {
        let options = defaults_with_host(Path::new("/opt/dolfinx"));
        let includes = options.require_list(keys::INCLUDE_DIRS).unwrap();
        assert_eq!(includes, &["/opt/dolfinx/include".to_string()]);
        assert_eq!(
            options.list(keys::LIBRARY_DIRS).unwrap(),
            &["/opt/dolfinx/lib".to_string()]
        );
        assert!(options.require_scalar(keys::OUTPUT_DIR).is_ok());
    }

    #[test]
    fn selection_follows_host_framework_variable() {
        let _guard = ENV_LOCK.lock();
        std::env::remove_var(HOST_FRAMEWORK_ROOT_VAR);
        let minimal = determine_default_compiler_options();
        assert_eq!(minimal.list(keys::INCLUDE_DIRS).unwrap().len(), 0);

        std::env::set_var(HOST_FRAMEWORK_ROOT_VAR, "/opt/dolfinx");
        let rich = determine_default_compiler_options();
        assert_eq!(
            rich.list(keys::INCLUDE_DIRS).unwrap(),
            &["/opt/dolfinx/include".to_string()]
        );
        std::env::remove_var(HOST_FRAMEWORK_ROOT_VAR);
    }

    #[test]
    fn runtime_include_dirs_reflect_environment() {
        let _guard = ENV_LOCK.lock();
        for var in ["MPI_HOME", "PETSC_DIR", "SLEPC_DIR"] {
            std::env::remove_var(var);
        }
        assert!(runtime_include_dirs().is_empty());

        std::env::set_var("PETSC_DIR", "/opt/petsc");
        std::env::set_var("MPI_HOME", "/usr/lib/mpich");
        let dirs = runtime_include_dirs();
        assert_eq!(
            dirs,
            vec![
                "/usr/lib/mpich/include".to_string(),
                "/opt/petsc/include".to_string()
            ]
        );
        std::env::remove_var("PETSC_DIR");
        std::env::remove_var("MPI_HOME");
    }
}
