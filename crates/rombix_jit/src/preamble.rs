//! Build descriptor embedded in staged sources.
//!
//! The staged file must be self-describing: the toolchain receives only an
//! artifact identifier, so every resolved option list travels inside the
//! generated source as a JSON block between `/* rombix:cfg` markers.

use serde::{Deserialize, Serialize};

use crate::options::{keys, CompilerOptions};

/// Marker opening the descriptor block in a staged source.
pub const CFG_BEGIN: &str = "/* rombix:cfg";

/// Marker closing the descriptor block in a staged source.
pub const CFG_END: &str = "rombix:cfg */";

/// Errors raised while rendering or recovering a build descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// The staged source contains no descriptor block.
    #[error("staged source has no build descriptor block")]
    Missing,

    /// The descriptor block is not valid JSON for [`BuildConfig`].
    #[error("malformed build descriptor: {0}")]
    Malformed(String),
}

/// The resolved option lists a compilation needs, in serializable form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Additional source files compiled into the module.
    pub sources: Vec<String>,
    /// Files whose modification invalidates the built artifact.
    pub dependencies: Vec<String>,
    /// Header search directories.
    pub include_dirs: Vec<String>,
    /// Extra compiler arguments.
    pub compiler_args: Vec<String>,
    /// Libraries linked into the module.
    pub libraries: Vec<String>,
    /// Library search directories.
    pub library_dirs: Vec<String>,
    /// Extra linker arguments.
    pub linker_args: Vec<String>,
}

impl BuildConfig {
    /// Collects the list-valued entries of `options` into a descriptor.
    ///
    /// Absent lists become empty; scalar entries under list keys are
    /// ignored (the required-key validation has already run by the time a
    /// descriptor is built).
    pub fn from_options(options: &CompilerOptions) -> Self {
        let take = |key: &str| -> Vec<String> {
            options.list(key).map(<[String]>::to_vec).unwrap_or_default()
        };
        Self {
            sources: take(keys::SOURCES),
            dependencies: take(keys::DEPENDENCIES),
            include_dirs: take(keys::INCLUDE_DIRS),
            compiler_args: take(keys::COMPILER_ARGS),
            libraries: take(keys::LIBRARIES),
            library_dirs: take(keys::LIBRARY_DIRS),
            linker_args: take(keys::LINKER_ARGS),
        }
    }

    /// Renders the descriptor block to prepend to the staged source.
    pub fn render(&self) -> Result<String, DescriptorError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DescriptorError::Malformed(e.to_string()))?;
        Ok(format!("{CFG_BEGIN}\n{json}\n{CFG_END}\n"))
    }

    /// Recovers the descriptor from a staged source.
    pub fn extract(staged: &str) -> Result<Self, DescriptorError> {
        let begin = staged.find(CFG_BEGIN).ok_or(DescriptorError::Missing)?;
        let body = &staged[begin + CFG_BEGIN.len()..];
        let end = body.find(CFG_END).ok_or(DescriptorError::Missing)?;
        serde_json::from_str(&body[..end]).map_err(|e| DescriptorError::Malformed(e.to_string()))
    }
}
