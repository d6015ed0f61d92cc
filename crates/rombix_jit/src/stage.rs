//! Leader-only staging of a package source.

use std::path::Path;

use rombix_common::ContentHash;

use crate::error::JitError;
use crate::options::CompilerOptions;
use crate::preamble::BuildConfig;

/// Placeholder token the package source uses to self-register its module.
///
/// Every literal occurrence is replaced by the artifact identifier, so the
/// compiled module registers under a name unique to its content hash.
pub const SIGNATURE_PLACEHOLDER: &str = "SIGNATURE";

/// Extension of staged generated sources.
pub const STAGED_EXT: &str = "cpp";

/// Stages `package_file` into `output_dir` and returns the artifact id.
///
/// Reads the source, derives `artifact_id = package_name + "_" + hash` from
/// its exact bytes, creates the output directory (idempotent), and writes
/// `<output_dir>/<artifact_id>.cpp` holding the build-descriptor preamble
/// followed by the placeholder-substituted source. A staged file that is
/// already present is left untouched, keeping a previously built artifact
/// eligible for cache hits.
///
/// This runs on the group leader only; callers route it through
/// `leader_broadcast` so non-leaders never recompute the hash (the source
/// could be rewritten concurrently).
pub fn stage_package(
    package_name: &str,
    package_file: &Path,
    output_dir: &Path,
    options: &CompilerOptions,
) -> Result<String, JitError> {
    let source = std::fs::read_to_string(package_file).map_err(|e| JitError::Io {
        action: "read",
        path: package_file.to_path_buf(),
        source: e,
    })?;

    let hash = ContentHash::from_bytes(source.as_bytes());
    let artifact_id = format!("{package_name}_{hash}");

    std::fs::create_dir_all(output_dir).map_err(|e| JitError::Io {
        action: "create",
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let staged_path = output_dir.join(format!("{artifact_id}.{STAGED_EXT}"));
    if staged_path.exists() {
        // The id encodes the content hash, so an existing staged file is
        // already this exact source; rewriting it would only invalidate the
        // built artifact's freshness.
        return Ok(artifact_id);
    }

    let preamble = BuildConfig::from_options(options)
        .render()
        .map_err(|e| JitError::Descriptor(e.to_string()))?;
    let staged = format!(
        "{preamble}\n{}",
        source.replace(SIGNATURE_PLACEHOLDER, &artifact_id)
    );

    std::fs::write(&staged_path, staged).map_err(|e| JitError::Io {
        action: "write",
        path: staged_path.clone(),
        source: e,
    })?;

    Ok(artifact_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::keys;
    use crate::preamble::BuildConfig;

    fn options() -> CompilerOptions {
        let mut options = CompilerOptions::new();
        options.set_list(keys::INCLUDE_DIRS, ["/usr/include"]);
        options
    }

    #[test]
    fn identical_content_gives_identical_artifact_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "void register_SIGNATURE() {}\n").unwrap();

        let first = stage_package("pkg", &file, dir.path(), &options()).unwrap();
        let second = stage_package("pkg", &file, dir.path(), &options()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_byte_change_changes_artifact_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");

        std::fs::write(&file, "int x = 0;\n").unwrap();
        let first = stage_package("pkg", &file, dir.path(), &options()).unwrap();

        std::fs::write(&file, "int x = 1;\n").unwrap();
        let second = stage_package("pkg", &file, dir.path(), &options()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn artifact_id_is_name_underscore_hash() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "// body\n").unwrap();

        let id = stage_package("frontier", &file, dir.path(), &options()).unwrap();
        let hash = id.strip_prefix("frontier_").unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn placeholder_is_substituted_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "void SIGNATURE_init();\nchar name[] = \"SIGNATURE\";\n").unwrap();

        let id = stage_package("pkg", &file, dir.path(), &options()).unwrap();
        let staged = std::fs::read_to_string(dir.path().join(format!("{id}.cpp"))).unwrap();
        let body = staged.split("rombix:cfg */").nth(1).unwrap();
        assert!(!body.contains("SIGNATURE_init"));
        assert!(body.contains(&format!("{id}_init")));
        assert!(body.contains(&format!("char name[] = \"{id}\"")));
    }

    #[test]
    fn staged_file_carries_recoverable_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "// body\n").unwrap();

        let mut options = options();
        options.set_list(keys::LIBRARIES, ["slepc"]);
        let id = stage_package("pkg", &file, dir.path(), &options).unwrap();

        let staged = std::fs::read_to_string(dir.path().join(format!("{id}.cpp"))).unwrap();
        let config = BuildConfig::extract(&staged).unwrap();
        assert_eq!(config.include_dirs, vec!["/usr/include".to_string()]);
        assert_eq!(config.libraries, vec!["slepc".to_string()]);
    }

    #[test]
    fn unreadable_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.cpp");
        let err = stage_package("pkg", &missing, dir.path(), &options()).unwrap_err();
        assert!(matches!(err, JitError::Io { action: "read", .. }));
    }

    #[test]
    fn output_directory_is_created_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pkg.cpp");
        std::fs::write(&file, "// body\n").unwrap();
        let out = dir.path().join("nested").join("cache");

        stage_package("pkg", &file, &out, &options()).unwrap();
        stage_package("pkg", &file, &out, &options()).unwrap();
        assert!(out.is_dir());
    }
}
