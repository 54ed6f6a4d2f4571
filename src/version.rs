//! Build identification.
//!
//! JSON `version` fields always report [`PKG_VERSION`]. The git metadata
//! embedded by `build.rs` is exposed through [`build_info`] and the
//! startup log line.

use serde::Serialize;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";

/// Where and when this binary was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_branch: &'static str,
    pub git_sha: &'static str,
    pub dirty: bool,
    pub built_at: &'static str,
}

/// Metadata captured at compile time; unknown fields read `"unknown"`.
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: PKG_VERSION,
        git_branch: option_env!("VERGEN_GIT_BRANCH").unwrap_or(UNKNOWN),
        git_sha: option_env!("VERGEN_GIT_SHA").unwrap_or(UNKNOWN),
        dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        built_at: option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or(UNKNOWN),
    }
}

impl BuildInfo {
    /// First seven characters of the commit hash.
    pub fn short_sha(&self) -> &'static str {
        self.git_sha.get(..7).unwrap_or(self.git_sha)
    }
}

/// `{version}+{branch}.{sha}`, suffixed with `.dirty` for uncommitted builds.
pub fn version_string() -> String {
    let build = build_info();
    let dirty = if build.dirty { ".dirty" } else { "" };
    format!(
        "{}+{}.{}{dirty}",
        build.version,
        build.git_branch,
        build.short_sha()
    )
}
