//! Locating optional data files and scratch directories.

use std::path::PathBuf;

/// Environment variable naming an extra directory to search for data files.
pub const TEST_DATA_ENV: &str = "AIRMAP_TEST_DATA";

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// First existing `name` under `$AIRMAP_TEST_DATA` or the workspace `testdata/`.
///
/// Reanalysis years and state boundary files are too large to commit, so
/// tests that want real data look for them here and skip when absent.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let from_env = std::env::var_os(TEST_DATA_ENV).map(|dir| PathBuf::from(dir).join(name));
    from_env
        .into_iter()
        .chain(std::iter::once(workspace_root().join("testdata").join(name)))
        .find(|path| path.exists())
}

/// Scratch directory removed when the handle is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create scratch directory")
}

/// Scratch directory whose name starts with `prefix`.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("create scratch directory")
}
