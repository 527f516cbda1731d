//! Assembles canonical grid records from raw datasets.
//!
//! Coordinates are rounded to 4 decimals, values to 3, time offsets to 2,
//! and arrays are flattened row-major as `t*nLat*nLon + i*nLon + j`.

use grid_common::{GridRecord, GridVariable};
use netcdf_parser::Dataset;
use tracing::{info, warn};

use crate::coords::{resolve_coords, ResolvedCoords};
use crate::error::{PipelineError, Result};
use crate::extract::{extract_variable, FieldKind};

pub const COORD_DECIMALS: u32 = 4;
pub const VALUE_DECIMALS: u32 = 3;
pub const TIME_DECIMALS: u32 = 2;

/// Names tried, in order, for the land-sea mask variable.
pub const LANDMASK_ALIASES: &[&str] = &["lsm", "land_sea_mask", "LSM"];

/// Output variable name of the land mask record.
pub const LANDMASK_VARIABLE: &str = "lsm";

/// Round half away from zero to `decimals` places. Negative zero becomes 0.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn round_all(values: &[f64], decimals: u32) -> Vec<f64> {
    values.iter().map(|&v| round_to(v, decimals)).collect()
}

/// Encode a time-varying dataset with the requested variables.
///
/// Variables missing from the dataset are skipped with a warning; the
/// record is still produced with whatever variables are present.
pub fn encode_time_varying(dataset: &Dataset, variables: &[String]) -> Result<GridRecord> {
    let coords = resolve_coords(dataset, true)?;
    let time = coords
        .time
        .as_ref()
        .ok_or_else(|| PipelineError::shape("time-varying dataset without a time axis"))?;

    let lat = round_all(&coords.latitude.ascending_values(), COORD_DECIMALS);
    let lon = round_all(&coords.longitude.ascending_values(), COORD_DECIMALS);
    let time_hours = round_all(&time.offsets_hours(), TIME_DECIMALS);
    let (n_time, n_lat, n_lon) = (time_hours.len(), lat.len(), lon.len());

    let mut encoded = Vec::with_capacity(variables.len());
    for name in variables {
        let Some(mut array) = extract_variable(dataset, name, &coords, FieldKind::Physical)? else {
            warn!(
                variable = %name,
                available = ?dataset.data_variable_names(),
                "Variable not in dataset, skipping"
            );
            continue;
        };

        if array.ndim() == 2 {
            array.insert_leading_axis(&time.axis.name);
        }
        if array.shape != [n_time, n_lat, n_lon] {
            return Err(PipelineError::shape(format!(
                "variable {} has shape {:?}, grid is ({}, {}, {})",
                name, array.shape, n_time, n_lat, n_lon
            )));
        }

        log_variable(name, &array.shape, array.range());
        encoded.push(GridVariable {
            name: name.clone(),
            values: round_all(&array.data, VALUE_DECIMALS),
        });
    }

    let record = GridRecord {
        lat,
        lon,
        time_hours: Some(time_hours),
        shape: vec![n_time, n_lat, n_lon],
        variables: encoded,
    };
    record.validate()?;
    Ok(record)
}

/// Encode a static land-sea mask. The output variable is always `lsm`.
pub fn encode_landmask(dataset: &Dataset, aliases: &[String]) -> Result<GridRecord> {
    let coords = resolve_coords(dataset, false)?;
    let source = landmask_variable(dataset, &coords, aliases)?;

    let lat = round_all(&coords.latitude.ascending_values(), COORD_DECIMALS);
    let lon = round_all(&coords.longitude.ascending_values(), COORD_DECIMALS);

    let array = extract_variable(dataset, &source, &coords, FieldKind::LandMask)?
        .ok_or_else(|| PipelineError::NoDataVariable(vec![source.clone()]))?;

    if array.shape != [lat.len(), lon.len()] {
        return Err(PipelineError::shape(format!(
            "land mask {} has shape {:?}, grid is ({}, {})",
            source,
            array.shape,
            lat.len(),
            lon.len()
        )));
    }

    let land_cells = array.data.iter().filter(|&&v| v > 0.5).count();
    let land_fraction = land_cells as f64 / array.len().max(1) as f64;
    info!(
        variable = %source,
        shape = ?array.shape,
        land_percent = round_to(land_fraction * 100.0, 1),
        "Encoded land mask"
    );

    let record = GridRecord {
        lat,
        lon,
        time_hours: None,
        shape: array.shape.clone(),
        variables: vec![GridVariable {
            name: LANDMASK_VARIABLE.to_string(),
            values: round_all(&array.data, VALUE_DECIMALS),
        }],
    };
    record.validate()?;
    Ok(record)
}

/// Pick the mask variable: the first alias present, else the first data
/// variable with at least two dimensions.
fn landmask_variable(
    dataset: &Dataset,
    coords: &ResolvedCoords,
    aliases: &[String],
) -> Result<String> {
    if let Some(name) = aliases.iter().find(|a| dataset.has_variable(a)) {
        return Ok(name.clone());
    }

    let fallback = dataset
        .variables
        .iter()
        .filter(|v| !v.is_coordinate() && v.ndim() >= 2)
        .map(|v| v.name.as_str())
        .find(|name| *name != coords.latitude.name && *name != coords.longitude.name);

    match fallback {
        Some(name) => {
            warn!(
                tried = ?aliases,
                available = ?dataset.data_variable_names(),
                using = name,
                "Land mask variable not found, using first data variable"
            );
            Ok(name.to_string())
        }
        None => Err(PipelineError::NoDataVariable(
            dataset
                .data_variable_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        )),
    }
}

fn log_variable(name: &str, shape: &[usize], range: Option<(f64, f64)>) {
    match range {
        Some((min, max)) => info!(
            variable = name,
            shape = ?shape,
            min = round_to(min, VALUE_DECIMALS),
            max = round_to(max, VALUE_DECIMALS),
            "Encoded variable"
        ),
        None => info!(variable = name, shape = ?shape, "Encoded empty variable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{descending_latitude_dataset, synthetic_currents, synthetic_wind};

    fn names(vars: &[&str]) -> Vec<String> {
        vars.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(36.083333, 4), 36.0833);
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(1.0005, 2), 1.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert!(round_to(-0.0001, 3).is_sign_positive());
    }

    #[test]
    fn test_reversal_scenario() {
        let record = encode_time_varying(&descending_latitude_dataset(), &names(&["uo"])).unwrap();

        assert_eq!(record.lat, vec![36.0, 37.0, 38.0, 39.0, 40.0]);
        assert_eq!(record.lon, vec![118.0, 119.0, 120.0]);
        assert_eq!(record.shape, vec![1, 5, 3]);
        let uo = record.variable("uo").unwrap();
        assert_eq!(uo[12..15], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_length_invariant_and_index_formula() {
        let ds = synthetic_currents(3, 4, 5);
        let record = encode_time_varying(&ds, &names(&["uo", "vo"])).unwrap();
        let len: usize = record.shape.iter().product();

        for var in &record.variables {
            assert_eq!(var.values.len(), len);
        }

        // create_test_grid stores t*100 + row*10 + col; ascending source.
        for t in 0..3 {
            for i in 0..4 {
                for j in 0..5 {
                    let expected = (t * 100 + i * 10 + j) as f64;
                    assert_eq!(record.value_at("uo", t, i, j), Some(expected));
                }
            }
        }
        assert_eq!(record.time_hours, Some(vec![0.0, 6.0, 12.0]));
    }

    #[test]
    fn test_missing_variable_skipped() {
        let ds = synthetic_currents(1, 2, 2);
        let record = encode_time_varying(&ds, &names(&["thetao", "uo"])).unwrap();
        assert_eq!(record.variable_names(), vec!["uo"]);
    }

    #[test]
    fn test_wind_seconds_axis_descending() {
        let ds = synthetic_wind(3, 2, 2);
        let record = encode_time_varying(&ds, &names(&["u10", "v10"])).unwrap();
        assert_eq!(record.time_hours, Some(vec![0.0, 1.0, 2.0]));
        assert_eq!(record.lat, vec![39.75, 40.0]);
        // Source row 1 (lat 39.75) col 0 at t=0 is 10.
        assert_eq!(record.value_at("u10", 0, 0, 0), Some(10.0));
        assert_eq!(record.value_at("v10", 0, 0, 0), Some(10.5));
    }

    #[test]
    fn test_missing_time_axis_fails() {
        let ds = Dataset::new()
            .with_coordinate("lat", vec![1.0])
            .with_coordinate("lon", vec![2.0])
            .with_variable("uo", &["lat", "lon"], vec![0.5])
            .unwrap();
        let err = encode_time_varying(&ds, &names(&["uo"])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingAxis { .. }));
    }

    #[test]
    fn test_two_dimensional_variable_is_one_step() {
        let ds = Dataset::new()
            .with_coordinate_units("time", vec![5.0], "hours since 2024-01-01")
            .with_coordinate("lat", vec![1.0, 2.0])
            .with_coordinate("lon", vec![3.0])
            .with_variable("thetao", &["lat", "lon"], vec![18.12345, f64::NAN])
            .unwrap();
        let record = encode_time_varying(&ds, &names(&["thetao"])).unwrap();
        assert_eq!(record.shape, vec![1, 2, 1]);
        assert_eq!(record.variable("thetao").unwrap(), &[18.123, 0.0]);
    }

    #[test]
    fn test_time_extent_mismatch_is_shape_error() {
        let ds = Dataset::new()
            .with_coordinate("time", vec![0.0, 1.0])
            .with_coordinate("step", vec![0.0, 1.0, 2.0])
            .with_coordinate("lat", vec![1.0])
            .with_coordinate("lon", vec![2.0])
            .with_variable("uo", &["step", "lat", "lon"], vec![0.0; 3])
            .unwrap();
        let err = encode_time_varying(&ds, &names(&["uo"])).unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
    }

    #[test]
    fn test_landmask_alias_and_fallback() {
        let aliases = names(LANDMASK_ALIASES);

        let ds = Dataset::new()
            .with_coordinate("latitude", vec![1.0, 0.0])
            .with_coordinate("longitude", vec![2.0])
            .with_variable("land_sea_mask", &["latitude", "longitude"], vec![0.2, 0.9])
            .unwrap();
        let record = encode_landmask(&ds, &aliases).unwrap();
        assert_eq!(record.variable_names(), vec!["lsm"]);
        assert_eq!(record.variable("lsm").unwrap(), &[0.9, 0.2]);
        assert!(record.time_hours.is_none());

        let ds = Dataset::new()
            .with_coordinate("latitude", vec![0.0])
            .with_coordinate("longitude", vec![2.0])
            .with_variable("mask", &["latitude", "longitude"], vec![f64::NAN])
            .unwrap();
        let record = encode_landmask(&ds, &aliases).unwrap();
        assert_eq!(record.variable("lsm").unwrap(), &[1.0]);
    }

    #[test]
    fn test_landmask_without_data_variable() {
        let ds = Dataset::new()
            .with_coordinate("latitude", vec![0.0])
            .with_coordinate("longitude", vec![2.0]);
        let err = encode_landmask(&ds, &names(LANDMASK_ALIASES)).unwrap_err();
        assert!(matches!(err, PipelineError::NoDataVariable(_)));
    }

    #[test]
    fn test_idempotent_bytes() {
        let a = encode_time_varying(&synthetic_currents(2, 3, 3), &names(&["uo", "vo"]))
            .unwrap()
            .to_json_bytes()
            .unwrap();
        let b = encode_time_varying(&synthetic_currents(2, 3, 3), &names(&["uo", "vo"]))
            .unwrap()
            .to_json_bytes()
            .unwrap();
        assert_eq!(a, b);
    }
}
