//! Compiler option maps and merge semantics.

use std::collections::BTreeMap;

use crate::error::JitError;

/// Well-known compiler option names.
pub mod keys {
    /// Directories searched for headers. List-valued, required.
    pub const INCLUDE_DIRS: &str = "include_dirs";
    /// Directory receiving staged sources and built artifacts. Scalar,
    /// required.
    pub const OUTPUT_DIR: &str = "output_dir";
    /// Additional source files compiled into the module.
    pub const SOURCES: &str = "sources";
    /// Files whose modification invalidates the built artifact.
    pub const DEPENDENCIES: &str = "dependencies";
    /// Extra compiler arguments.
    pub const COMPILER_ARGS: &str = "compiler_args";
    /// Libraries linked into the module.
    pub const LIBRARIES: &str = "libraries";
    /// Directories searched for libraries.
    pub const LIBRARY_DIRS: &str = "library_dirs";
    /// Extra linker arguments.
    pub const LINKER_ARGS: &str = "linker_args";
}

/// A single compiler option: either one string or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A single replaceable value, e.g. `output_dir`.
    Scalar(String),
    /// An ordered, concatenable list, e.g. `include_dirs`.
    List(Vec<String>),
}

/// An ordered mapping from option name to [`OptionValue`].
///
/// Built by merging a platform-determined default set with caller-supplied
/// overrides: list-valued options concatenate (defaults first), scalar
/// options are replaced outright (the caller wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl CompilerOptions {
    /// Creates an empty option map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar option, replacing any previous value.
    pub fn set_scalar(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(name.into(), OptionValue::Scalar(value.into()));
    }

    /// Sets a list option, replacing any previous value.
    pub fn set_list<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            name.into(),
            OptionValue::List(values.into_iter().map(Into::into).collect()),
        );
    }

    /// Returns the raw value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    /// Returns the scalar value for `name`, if present and scalar.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(OptionValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the list value for `name`, if present and list-valued.
    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.entries.get(name) {
            Some(OptionValue::List(values)) => Some(values),
            _ => None,
        }
    }

    /// Returns the required list option `name` or a contract-violation error.
    pub fn require_list(&self, name: &'static str) -> Result<&[String], JitError> {
        match self.entries.get(name) {
            Some(OptionValue::List(values)) => Ok(values),
            Some(OptionValue::Scalar(_)) => Err(JitError::OptionKind {
                name,
                expected: "list",
            }),
            None => Err(JitError::MissingOption(name)),
        }
    }

    /// Returns the required scalar option `name` or a contract-violation error.
    pub fn require_scalar(&self, name: &'static str) -> Result<&str, JitError> {
        match self.entries.get(name) {
            Some(OptionValue::Scalar(value)) => Ok(value),
            Some(OptionValue::List(_)) => Err(JitError::OptionKind {
                name,
                expected: "scalar",
            }),
            None => Err(JitError::MissingOption(name)),
        }
    }

    /// Overlays `overrides` onto `self`.
    ///
    /// When both sides hold a list, the override is appended after the
    /// existing entries. In every other case the override replaces the
    /// existing value.
    pub fn merge_overrides(&mut self, overrides: CompilerOptions) {
        for (name, value) in overrides.entries {
            match (self.entries.get_mut(&name), value) {
                (Some(OptionValue::List(existing)), OptionValue::List(extra)) => {
                    existing.extend(extra);
                }
                (_, value) => {
                    self.entries.insert(name, value);
                }
            }
        }
    }

    /// Appends `items` to the list option `name`, creating it if absent.
    ///
    /// A scalar under the same name is replaced by the new list.
    pub fn extend_list<I, S>(&mut self, name: impl Into<String>, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let items = items.into_iter().map(Into::into);
        match self.entries.get_mut(&name) {
            Some(OptionValue::List(existing)) => existing.extend(items),
            _ => {
                self.entries
                    .insert(name, OptionValue::List(items.collect()));
            }
        }
    }
}
