//! Fallback reader that shells out to `ncdump` and parses its CDL output.
//!
//! Slower than the native reader but needs only the netcdf command-line
//! tools, not the development libraries.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::cdl::parse_cdl;
use crate::dataset::Dataset;
use crate::error::{NetCdfError, NetCdfResult};

/// Read a whole NetCDF file via `ncdump -p 9,17`.
pub fn read_with_ncdump<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    let path = path.as_ref();

    let output = Command::new("ncdump")
        .arg("-p")
        .arg("9,17") // High precision
        .arg(path)
        .output()
        .map_err(|e| NetCdfError::CommandError(format!("Failed to run ncdump: {}", e)))?;

    if !output.status.success() {
        return Err(NetCdfError::CommandError(format!(
            "ncdump failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    debug!(path = %path.display(), bytes = text.len(), "Parsing ncdump output");
    parse_cdl(&text)
}
