//! Group-coordinated compilation of a package.

use std::path::{Path, PathBuf};

use rombix_group::{GroupError, ProcessGroup, TaskError};

use crate::defaults::{determine_default_compiler_options, runtime_include_dirs};
use crate::env::{CompilerEnv, MpiConfig};
use crate::error::JitError;
use crate::options::{keys, CompilerOptions};
use crate::search_path;
use crate::stage::stage_package;
use crate::toolchain::{NativeModule, SystemToolchain, Toolchain};

/// Compiles a C++ package and returns its module handle on every rank.
///
/// Equivalent to [`compile_with`] using the [`SystemToolchain`].
pub fn compile<G: ProcessGroup>(
    group: &G,
    package_name: &str,
    package_root: &Path,
    package_file: &Path,
    options: CompilerOptions,
) -> Result<NativeModule, JitError> {
    compile_with(
        group,
        &SystemToolchain::new(),
        package_name,
        package_root,
        package_file,
        options,
    )
}

/// Compiles a C++ package through an explicit toolchain.
///
/// The flow compiles at most once per distinct content hash per machine and
/// either succeeds on every rank or fails on every rank:
///
/// 1. Platform defaults are overlaid with `options`; the include directories
///    of the runtimes present in the environment and `package_root` are
///    appended. Required keys are validated before any side effect.
/// 2. The leader stages the source (hash, placeholder substitution, build
///    descriptor) and the resulting artifact id is broadcast; non-leaders
///    never recompute the hash, so a concurrent rewrite of `package_file`
///    cannot diverge the group.
/// 3. Every rank appends the output directory to the module search path.
/// 4. `CC`/`CXX` are scoped to the MPI wrappers for the duration of the
///    call when not already set by the caller.
/// 5. With more than one rank, the leader alone invokes the toolchain; a
///    failure there aborts the whole group before anyone proceeds.
/// 6. Every rank invokes the toolchain again; the artifact is on disk by
///    now, so this is the inexpensive cache-hit path that makes the module
///    available without shipping binaries over the group channel.
pub fn compile_with<G, T>(
    group: &G,
    toolchain: &T,
    package_name: &str,
    package_root: &Path,
    package_file: &Path,
    options: CompilerOptions,
) -> Result<NativeModule, JitError>
where
    G: ProcessGroup,
    T: Toolchain,
{
    let resolved = resolve_options(determine_default_compiler_options(), options, package_root)?;
    let output_dir = PathBuf::from(resolved.require_scalar(keys::OUTPUT_DIR)?);

    let artifact_id: String = group.leader_broadcast(|| {
        stage_package(package_name, package_file, &output_dir, &resolved)
            .map_err(|e| TaskError::new(e.to_string()))
    })?;

    search_path::global().append(&output_dir);

    let _compiler_env = CompilerEnv::acquire(&MpiConfig::from_env());

    if group.size() > 1 {
        // Leader-only compilation; everyone observes the outcome before any
        // rank is allowed to touch the cache.
        group
            .leader_broadcast(|| {
                toolchain
                    .compile_and_load(&artifact_id)
                    .map(|_| ())
                    .map_err(|e| TaskError::new(e.message))
            })
            .map_err(|e| match e {
                GroupError::Task(task) => JitError::Build(task.message),
                other => JitError::Group(other),
            })?;
    }

    toolchain
        .compile_and_load(&artifact_id)
        .map_err(|e| JitError::Build(e.message))
}

/// Merges defaults with caller overrides and appends the runtime and
/// package-root include directories.
///
/// Fails on a missing or malformed required key before any filesystem or
/// process-group interaction.
pub fn resolve_options(
    defaults: CompilerOptions,
    overrides: CompilerOptions,
    package_root: &Path,
) -> Result<CompilerOptions, JitError> {
    let mut resolved = defaults;
    resolved.merge_overrides(overrides);

    resolved.require_list(keys::INCLUDE_DIRS)?;
    resolved.require_scalar(keys::OUTPUT_DIR)?;

    let mut extra = runtime_include_dirs();
    extra.push(package_root.to_string_lossy().into_owned());
    resolved.extend_list(keys::INCLUDE_DIRS, extra);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::BuildFailure;
    use rombix_group::{LocalCluster, SoloGroup};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockToolchain {
        calls: AtomicUsize,
        failure: Option<&'static str>,
    }

    impl MockToolchain {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failure: None,
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failure: Some(message),
            }
        }
    }

    impl Toolchain for MockToolchain {
        fn compile_and_load(&self, artifact_id: &str) -> Result<NativeModule, BuildFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failure {
                Some(message) => Err(BuildFailure::new(message)),
                None => Ok(NativeModule::new(
                    artifact_id,
                    format!("/tmp/{artifact_id}.so"),
                )),
            }
        }
    }

    fn overrides(output_dir: &Path) -> CompilerOptions {
        let mut options = CompilerOptions::new();
        options.set_scalar(keys::OUTPUT_DIR, output_dir.to_string_lossy());
        options
    }

    #[test]
    fn resolve_rejects_missing_include_dirs() {
        let mut defaults = CompilerOptions::new();
        defaults.set_scalar(keys::OUTPUT_DIR, "/tmp");
        let err =
            resolve_options(defaults, CompilerOptions::new(), Path::new("/pkg")).unwrap_err();
        assert!(matches!(err, JitError::MissingOption(keys::INCLUDE_DIRS)));
    }

    #[test]
    fn resolve_rejects_missing_output_dir() {
        let mut defaults = CompilerOptions::new();
        defaults.set_list(keys::INCLUDE_DIRS, Vec::<String>::new());
        let err =
            resolve_options(defaults, CompilerOptions::new(), Path::new("/pkg")).unwrap_err();
        assert!(matches!(err, JitError::MissingOption(keys::OUTPUT_DIR)));
    }

    #[test]
    fn resolve_appends_package_root_last() {
        let mut defaults = CompilerOptions::new();
        defaults.set_list(keys::INCLUDE_DIRS, ["/usr/include"]);
        defaults.set_scalar(keys::OUTPUT_DIR, "/tmp");
        let resolved =
            resolve_options(defaults, CompilerOptions::new(), Path::new("/pkg/root")).unwrap();
        let includes = resolved.list(keys::INCLUDE_DIRS).unwrap();
        assert_eq!(includes.first().unwrap(), "/usr/include");
        assert_eq!(includes.last().unwrap(), "/pkg/root");
    }

    #[test]
    fn serial_compile_returns_module_named_after_artifact() {
        let _env = crate::test_env::ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "void register_SIGNATURE() {}\n").unwrap();
        let out = dir.path().join("cache");

        let toolchain = MockToolchain::succeeding();
        let module = compile_with(
            &SoloGroup::new(),
            &toolchain,
            "pkg",
            dir.path(),
            &file,
            overrides(&out),
        )
        .unwrap();

        assert!(module.name().starts_with("pkg_"));
        // Serial groups skip the leader-only pass: one invocation total.
        assert_eq!(toolchain.calls.load(Ordering::SeqCst), 1);
        assert!(out.join(format!("{}.cpp", module.name())).exists());
        assert!(search_path::global()
            .entries()
            .iter()
            .any(|entry| entry == &out));
    }

    #[test]
    fn serial_compile_is_idempotent_per_content() {
        let _env = crate::test_env::ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "void register_SIGNATURE() {}\n").unwrap();
        let out = dir.path().join("cache");

        let toolchain = MockToolchain::succeeding();
        let group = SoloGroup::new();
        let first = compile_with(&group, &toolchain, "pkg", dir.path(), &file, overrides(&out))
            .unwrap();
        let second = compile_with(&group, &toolchain, "pkg", dir.path(), &file, overrides(&out))
            .unwrap();
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn group_compile_runs_leader_pass_then_cache_hits() {
        let _env = crate::test_env::ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "void register_SIGNATURE() {}\n").unwrap();
        let out = dir.path().join("cache");

        let toolchain = MockToolchain::succeeding();
        let modules = LocalCluster::run(2, |member| {
            compile_with(&member, &toolchain, "pkg", dir.path(), &file, overrides(&out)).unwrap()
        });

        assert_eq!(modules[0], modules[1]);
        // One leader compilation plus one cache-hit load per rank.
        assert_eq!(toolchain.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn leader_build_failure_aborts_every_rank() {
        let _env = crate::test_env::ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "void register_SIGNATURE() {}\n").unwrap();
        let out = dir.path().join("cache");

        let toolchain = MockToolchain::failing("undefined reference to `petsc_init`");
        let results = LocalCluster::run(2, |member| {
            compile_with(&member, &toolchain, "pkg", dir.path(), &file, overrides(&out))
        });

        for outcome in results {
            match outcome.unwrap_err() {
                JitError::Build(message) => assert!(message.contains("petsc_init")),
                other => panic!("expected Build, got {other:?}"),
            }
        }
        // The leader failed once; no rank reached the cache-hit pass.
        assert_eq!(toolchain.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unreadable_source_fails_the_whole_group() {
        let _env = crate::test_env::ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.cpp");
        let out = dir.path().join("cache");

        let toolchain = MockToolchain::succeeding();
        let results = LocalCluster::run(2, |member| {
            compile_with(&member, &toolchain, "pkg", dir.path(), &missing, overrides(&out))
        });

        for outcome in results {
            let err = outcome.unwrap_err();
            assert!(format!("{err}").contains("read"));
        }
        assert_eq!(toolchain.calls.load(Ordering::SeqCst), 0);
    }
}
