//! Canonical grid records and on-disk fixtures for storage and server tests.

use std::path::{Path, PathBuf};

use grid_common::{GridName, GridRecord, GridVariable};

/// A small time-varying current record: 2 steps, 2 latitudes, 3 longitudes.
pub fn sample_current_record() -> GridRecord {
    GridRecord {
        lat: vec![36.0, 36.0833],
        lon: vec![118.0, 118.0833, 118.1667],
        time_hours: Some(vec![0.0, 6.0]),
        shape: vec![2, 2, 3],
        variables: vec![
            GridVariable {
                name: "uo".to_string(),
                values: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6],
            },
            GridVariable {
                name: "vo".to_string(),
                values: vec![-0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.2],
            },
        ],
    }
}

/// A small static land mask record.
pub fn sample_landmask_record() -> GridRecord {
    GridRecord {
        lat: vec![36.0, 36.1],
        lon: vec![118.0, 118.1],
        time_hours: None,
        shape: vec![2, 2],
        variables: vec![GridVariable {
            name: "lsm".to_string(),
            values: vec![1.0, 0.0, 1.0, 0.0],
        }],
    }
}

/// Persist a record as `<dir>/<name>_grid.json` and return its bytes.
pub fn write_grid_record(dir: &Path, name: GridName, record: &GridRecord) -> Vec<u8> {
    let bytes = record.to_json_bytes().expect("serializable record");
    std::fs::write(dir.join(name.file_name()), &bytes).expect("writable fixture dir");
    bytes
}

/// Write arbitrary text (e.g. a CDL dataset) into `dir` and return its path.
pub fn write_fixture(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).expect("writable fixture dir");
    path
}

/// A CDL temperature dataset that lacks the `thetao` variable entirely.
pub const SST_WITHOUT_THETAO_CDL: &str = r#"netcdf cmems_sst {
dimensions:
	time = 1 ;
	latitude = 2 ;
	longitude = 2 ;
variables:
	double time(time) ;
		time:units = "hours since 1950-01-01" ;
	float latitude(latitude) ;
	float longitude(longitude) ;
	float so(time, latitude, longitude) ;
data:

 time = 648000 ;

 latitude = 36, 37 ;

 longitude = 118, 119 ;

 so = 31.1, 31.2, 31.3, 31.4 ;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_records_are_valid() {
        sample_current_record().validate().unwrap();
        sample_landmask_record().validate().unwrap();
    }

    #[test]
    fn test_write_grid_record() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = write_grid_record(dir.path(), GridName::Landmask, &sample_landmask_record());
        let on_disk = std::fs::read(dir.path().join("landmask_grid.json")).unwrap();
        assert_eq!(bytes, on_disk);
    }

    #[test]
    fn test_sst_fixture_parses() {
        let ds = netcdf_parser::parse_cdl(SST_WITHOUT_THETAO_CDL).unwrap();
        assert!(ds.variable("thetao").is_none());
        assert_eq!(ds.variable("so").unwrap().shape, vec![1, 2, 2]);
    }
}
