//! NetCDF reader for gridded ocean and atmosphere fields.
//!
//! Files are read whole into a [`Dataset`]: named dimensions plus named
//! numeric variables, with CF packing decoded to `f64` and missing cells as
//! NaN. Downstream code only ever sees "a dataset exposing named axes and
//! named variables", whatever provider produced the file.
//!
//! # Implementation Notes
//!
//! With the `native` feature the `netcdf` crate reads files directly
//! (requires libhdf5-dev and libnetcdf-dev). Without it, the `ncdump`
//! command-line tool is used and its CDL output parsed. Files ending in
//! `.cdl` are parsed as CDL text directly, which is also how test fixtures
//! are stored.

pub mod cdl;
pub mod dataset;
pub mod error;
#[cfg(feature = "native")]
pub mod native;
pub mod ncdump;
pub mod time;

use std::path::Path;

pub use cdl::parse_cdl;
pub use dataset::{Attribute, AttributeValue, Dataset, Dimension, Variable};
pub use error::{NetCdfError, NetCdfResult};
pub use time::{CfTimeUnits, TimeUnit};

/// Open a raw dataset, picking the reader from the file extension and the
/// enabled features.
pub fn open_dataset<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    let path = path.as_ref();
    let is_cdl = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("cdl"));

    if is_cdl {
        let text = std::fs::read_to_string(path)?;
        return parse_cdl(&text);
    }

    #[cfg(feature = "native")]
    {
        native::read_native(path)
    }

    #[cfg(not(feature = "native"))]
    {
        ncdump::read_with_ncdump(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_cdl_file() {
        let mut file = tempfile::Builder::new().suffix(".cdl").tempfile().unwrap();
        write!(
            file,
            "netcdf mask {{\ndimensions:\n\tlat = 2 ;\n\tlon = 2 ;\nvariables:\n\tfloat lat(lat) ;\n\tfloat lon(lon) ;\n\tfloat lsm(lat, lon) ;\ndata:\n lat = 36, 37 ;\n lon = 118, 119 ;\n lsm = 0, 1, _, 0 ;\n}}\n"
        )
        .unwrap();

        let ds = open_dataset(file.path()).unwrap();
        let lsm = ds.variable("lsm").unwrap();
        assert_eq!(lsm.shape, vec![2, 2]);
        assert!(lsm.data[2].is_nan());
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_dataset("/nonexistent/definitely_missing.cdl");
        assert!(matches!(result, Err(NetCdfError::IoError(_))));
    }
}
