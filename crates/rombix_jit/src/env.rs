//! Scoped compiler-selection environment variables.

/// Environment variable selecting the C compiler.
pub const CC_VAR: &str = "CC";

/// Environment variable selecting the C++ compiler.
pub const CXX_VAR: &str = "CXX";

/// MPI-aware compiler wrapper names from the parallel runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpiConfig {
    /// The MPI C compiler wrapper, e.g. `mpicc`.
    pub mpicc: String,
    /// The MPI C++ compiler wrapper, e.g. `mpicxx`.
    pub mpicxx: String,
}

impl MpiConfig {
    /// Reads the wrapper names from `MPICC`/`MPICXX`, with the conventional
    /// names as fallback.
    pub fn from_env() -> Self {
        Self {
            mpicc: std::env::var("MPICC").unwrap_or_else(|_| "mpicc".to_string()),
            mpicxx: std::env::var("MPICXX").unwrap_or_else(|_| "mpicxx".to_string()),
        }
    }
}

/// RAII scope for `CC`/`CXX` during compilation.
///
/// On acquire, each variable is set to its MPI wrapper only if it is absent;
/// a caller-defined value is never overwritten. On drop, exactly the
/// variables this guard set are removed, restoring the pre-call environment
/// on success and failure paths alike.
#[derive(Debug)]
pub struct CompilerEnv {
    set_cc: bool,
    set_cxx: bool,
}

impl CompilerEnv {
    /// Acquires the scope, installing absent compiler-selection variables.
    pub fn acquire(config: &MpiConfig) -> Self {
        let set_cc = std::env::var_os(CC_VAR).is_none();
        if set_cc {
            std::env::set_var(CC_VAR, &config.mpicc);
        }
        let set_cxx = std::env::var_os(CXX_VAR).is_none();
        if set_cxx {
            std::env::set_var(CXX_VAR, &config.mpicxx);
        }
        Self { set_cc, set_cxx }
    }
}

impl Drop for CompilerEnv {
    fn drop(&mut self) {
        if self.set_cc {
            std::env::remove_var(CC_VAR);
        }
        if self.set_cxx {
            std::env::remove_var(CXX_VAR);
        }
    }
}
