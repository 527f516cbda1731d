//! Coordinate resolution across provider naming conventions.
//!
//! Each axis has an ordered list of accepted names; the first one present
//! as a 1-D variable in the dataset wins.

use std::fmt;

use netcdf_parser::{CfTimeUnits, Dataset, Variable};
use tracing::warn;

use crate::error::{PipelineError, Result};

pub const LATITUDE_ALIASES: &[&str] = &["latitude", "lat", "y"];
pub const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon", "x"];
pub const TIME_ALIASES: &[&str] = &["time", "valid_time"];

/// Vertical axes collapsed to their first (surface) level.
pub const DEPTH_ALIASES: &[&str] = &["depth", "level", "z"];

/// The axes the pipeline needs to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Latitude,
    Longitude,
    Time,
}

impl AxisKind {
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            AxisKind::Latitude => LATITUDE_ALIASES,
            AxisKind::Longitude => LONGITUDE_ALIASES,
            AxisKind::Time => TIME_ALIASES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisKind::Latitude => "latitude",
            AxisKind::Longitude => "longitude",
            AxisKind::Time => "time",
        }
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located axis with its values in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxis {
    /// Name the axis has in the dataset.
    pub name: String,
    pub values: Vec<f64>,
    pub ascending: bool,
}

impl ResolvedAxis {
    fn from_variable(var: &Variable) -> Self {
        Self {
            name: var.name.clone(),
            values: var.data.clone(),
            ascending: is_ascending(&var.data),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values reordered to ascending.
    pub fn ascending_values(&self) -> Vec<f64> {
        let mut values = self.values.clone();
        if !self.ascending {
            values.reverse();
        }
        values
    }
}

/// A time axis together with its CF units, if they could be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub axis: ResolvedAxis,
    pub units: Option<CfTimeUnits>,
}

impl TimeAxis {
    /// Offsets from the first timestamp, in hours.
    pub fn offsets_hours(&self) -> Vec<f64> {
        let scale = self.units.as_ref().map_or(1.0, |u| u.unit.hours());
        let t0 = self.axis.values.first().copied().unwrap_or(0.0);
        self.axis.values.iter().map(|t| (t - t0) * scale).collect()
    }
}

/// Axes resolved for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCoords {
    pub latitude: ResolvedAxis,
    pub longitude: ResolvedAxis,
    pub time: Option<TimeAxis>,
}

/// An axis counts as ascending when its first value is below its last;
/// single-point axes are ascending.
pub fn is_ascending(values: &[f64]) -> bool {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 => first < last,
        _ => true,
    }
}

/// The first alias present as a 1-D variable.
pub fn find_axis<'a>(dataset: &'a Dataset, kind: AxisKind) -> Option<&'a Variable> {
    kind.aliases()
        .iter()
        .filter_map(|alias| dataset.variable(alias))
        .find(|var| var.ndim() == 1)
}

/// Locate a required axis.
pub fn resolve_axis(dataset: &Dataset, kind: AxisKind) -> Result<ResolvedAxis> {
    find_axis(dataset, kind)
        .map(ResolvedAxis::from_variable)
        .ok_or_else(|| missing_axis(dataset, kind))
}

/// Locate latitude and longitude, and time when present.
///
/// With `require_time`, a dataset without any time alias is rejected.
pub fn resolve_coords(dataset: &Dataset, require_time: bool) -> Result<ResolvedCoords> {
    let latitude = resolve_axis(dataset, AxisKind::Latitude)?;
    let longitude = resolve_axis(dataset, AxisKind::Longitude)?;

    let time = match find_axis(dataset, AxisKind::Time) {
        Some(var) => Some(resolve_time(var)),
        None if require_time => return Err(missing_axis(dataset, AxisKind::Time)),
        None => None,
    };

    Ok(ResolvedCoords {
        latitude,
        longitude,
        time,
    })
}

fn resolve_time(var: &Variable) -> TimeAxis {
    let units = match var.text_attribute("units") {
        Some(text) => match CfTimeUnits::parse(text) {
            Ok(units) => Some(units),
            Err(e) => {
                warn!(axis = %var.name, error = %e, "Unparseable time units, assuming hours");
                None
            }
        },
        None => {
            warn!(axis = %var.name, "Time axis has no units, assuming hours");
            None
        }
    };

    TimeAxis {
        axis: ResolvedAxis::from_variable(var),
        units,
    }
}

fn missing_axis(dataset: &Dataset, kind: AxisKind) -> PipelineError {
    let mut present: Vec<String> = dataset
        .dimension_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for name in dataset.coordinate_names() {
        if !present.iter().any(|p| p == name) {
            present.push(name.to_string());
        }
    }

    PipelineError::MissingAxis {
        axis: kind.to_string(),
        tried: kind.aliases().iter().map(|a| a.to_string()).collect(),
        present,
    }
}
