//! Test support for the ocean-grids workspace.
//!
//! - [`paths`]: where raw dataset fixtures live
//! - [`generators`]: synthetic provider datasets (currents, wind, land mask)
//! - [`fixtures`]: canonical grid records written to a store directory

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve one or more raw fixtures, or return early from the test.
///
/// Evaluates to a `Vec<PathBuf>` in argument order. When any fixture is
/// missing the test logs which one and passes without running, so suites
/// that need real provider files stay green on machines without them.
///
/// ```ignore
/// let paths = require_fixtures!("cmems_currents.nc", "era5_wind.nc");
/// ```
#[macro_export]
macro_rules! require_fixtures {
    ($($name:expr),+ $(,)?) => {{
        let mut found = Vec::new();
        $(
            let Some(path) = $crate::fixture_path($name) else {
                eprintln!(
                    "skipping: fixture {} not found (set {})",
                    $name,
                    $crate::TEST_DATA_ENV
                );
                return;
            };
            found.push(path);
        )+
        found
    }};
}

/// Assert two numbers are within `tolerance` of each other.
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let (actual, expected, tolerance) = ($actual as f64, $expected as f64, $tolerance as f64);
        assert!(
            (actual - expected).abs() <= tolerance,
            "{} differs from {} by more than {}",
            actual,
            expected,
            tolerance
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_within_tolerance() {
        assert_approx_eq!(0.3001, 0.3, 0.001);
        assert_approx_eq!(-1.5f32, -1.500001, 1e-4);
    }

    #[test]
    #[should_panic(expected = "differs from")]
    fn test_approx_outside_tolerance() {
        assert_approx_eq!(1.3, 1.2, 0.01);
    }

    #[test]
    fn test_require_fixtures_in_order() {
        let paths = require_fixtures!("era5_landmask.cdl", "cmems_currents.cdl");
        assert!(paths[0].ends_with("era5_landmask.cdl"));
        assert!(paths[1].ends_with("cmems_currents.cdl"));
    }
}
