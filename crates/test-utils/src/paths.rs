//! Location of raw dataset fixtures.
//!
//! The small CDL fixtures ship in `crates/grid-processor/testdata/`. Real
//! provider downloads are too large to commit; point `GRID_TEST_DATA_DIR`
//! at a directory holding them to run the tests that need them.

use std::path::{Path, PathBuf};

/// Environment variable naming an extra fixture directory.
pub const TEST_DATA_ENV: &str = "GRID_TEST_DATA_DIR";

/// Directory of the fixtures bundled with the workspace.
pub fn bundled_testdata_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../grid-processor/testdata")
}

/// Path of fixture `name`, looking in `GRID_TEST_DATA_DIR` first.
pub fn fixture_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(TEST_DATA_ENV)
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain(std::iter::once(bundled_testdata_dir().join(name)))
        .find(|path| path.is_file())
}
