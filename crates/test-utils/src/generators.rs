//! Synthetic raw datasets shaped like the provider files the pipeline reads.
//!
//! Values follow predictable patterns so tests can check where each source
//! cell ended up after reorientation and flattening.

use netcdf_parser::Dataset;

/// Evenly spaced axis from `start` with `count` points and `step` spacing.
pub fn axis(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|k| start + step * k as f64).collect()
}

/// Creates a test grid with predictable values.
///
/// Each cell value is `t * 100 + row * 10 + col`, in row-major source
/// order, so a value identifies its source position.
pub fn create_test_grid(n_time: usize, height: usize, width: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(n_time * width * height);
    for t in 0..n_time {
        for row in 0..height {
            for col in 0..width {
                data.push((t * 100 + row * 10 + col) as f64);
            }
        }
    }
    data
}

/// The reversal scenario: latitude `[40, 39, 38, 37, 36]` (descending),
/// longitude `[118, 119, 120]`, one time step, and `uo` whose first source
/// row (lat 40) is `[1, 2, 3]`, second `[4, 5, 6]` and so on.
pub fn descending_latitude_dataset() -> Dataset {
    let uo: Vec<f64> = (1..=15).map(|v| v as f64).collect();
    Dataset::new()
        .with_coordinate_units("time", vec![0.0], "hours since 2024-01-15 00:00:00")
        .with_coordinate("latitude", vec![40.0, 39.0, 38.0, 37.0, 36.0])
        .with_coordinate("longitude", vec![118.0, 119.0, 120.0])
        .with_variable("uo", &["time", "latitude", "longitude"], uo)
        .expect("valid synthetic dataset")
}

/// Ocean-analysis style currents: `(time, depth, latitude, longitude)` with
/// ascending latitude, a single surface depth level, 6-hourly time in
/// "hours since 1950-01-01", and `uo`/`vo` from [`create_test_grid`].
///
/// The cell at `(t=0, row=0, col=0)` of `vo` is NaN.
pub fn synthetic_currents(n_time: usize, n_lat: usize, n_lon: usize) -> Dataset {
    let time = (0..n_time).map(|t| 648_000.0 + 6.0 * t as f64).collect();
    let uo = create_test_grid(n_time, n_lat, n_lon);
    let mut vo: Vec<f64> = uo.iter().map(|v| -v / 10.0).collect();
    if let Some(first) = vo.first_mut() {
        *first = f64::NAN;
    }

    Dataset::new()
        .with_coordinate_units("time", time, "hours since 1950-01-01")
        .with_coordinate("depth", vec![0.494])
        .with_coordinate("latitude", axis(36.0, 0.083333, n_lat))
        .with_coordinate("longitude", axis(118.0, 0.083333, n_lon))
        .with_variable("uo", &["time", "depth", "latitude", "longitude"], uo)
        .and_then(|ds| ds.with_variable("vo", &["time", "depth", "latitude", "longitude"], vo))
        .expect("valid synthetic dataset")
}

/// Reanalysis style wind: `valid_time` in "seconds since 1970-01-01",
/// descending latitude, hourly steps, `u10`/`v10`.
pub fn synthetic_wind(n_time: usize, n_lat: usize, n_lon: usize) -> Dataset {
    let time = (0..n_time)
        .map(|t| 1_705_276_800.0 + 3600.0 * t as f64)
        .collect();
    let u10 = create_test_grid(n_time, n_lat, n_lon);
    let v10 = u10.iter().map(|v| v + 0.5).collect();

    Dataset::new()
        .with_coordinate_units("valid_time", time, "seconds since 1970-01-01")
        .with_coordinate("latitude", axis(40.0, -0.25, n_lat))
        .with_coordinate("longitude", axis(118.0, 0.25, n_lon))
        .with_variable("u10", &["valid_time", "latitude", "longitude"], u10)
        .and_then(|ds| ds.with_variable("v10", &["valid_time", "latitude", "longitude"], v10))
        .expect("valid synthetic dataset")
}

/// Land-sea mask as delivered by the reanalysis provider: a single
/// `valid_time` step, descending latitude, `lsm` in `[0, 1]` with one NaN
/// cell in the first source row.
pub fn synthetic_landmask(n_lat: usize, n_lon: usize) -> Dataset {
    let mut lsm: Vec<f64> = (0..n_lat * n_lon)
        .map(|k| if k % n_lon < n_lon / 2 { 1.0 } else { 0.0 })
        .collect();
    if n_lon > 1 {
        lsm[n_lon - 1] = f64::NAN;
    }

    Dataset::new()
        .with_coordinate_units("valid_time", vec![0.0], "hours since 2024-01-15")
        .with_coordinate("latitude", axis(40.0, -0.1, n_lat))
        .with_coordinate("longitude", axis(118.0, 0.1, n_lon))
        .with_variable("lsm", &["valid_time", "latitude", "longitude"], lsm)
        .expect("valid synthetic dataset")
}
