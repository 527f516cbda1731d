//! Logical grid names and the canonical flat-array layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::GridError;

/// One of the logical grids the pipeline produces and the server exposes.
///
/// The set is fixed: a grid name is the unit of caching and serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridName {
    Wind,
    Current,
    Temperature,
    Landmask,
}

impl GridName {
    /// All recognized grid names, in reporting order.
    pub const ALL: [GridName; 4] = [
        GridName::Wind,
        GridName::Current,
        GridName::Temperature,
        GridName::Landmask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GridName::Wind => "wind",
            GridName::Current => "current",
            GridName::Temperature => "temperature",
            GridName::Landmask => "landmask",
        }
    }

    /// File name of the persisted canonical record, e.g. `wind_grid.json`.
    pub fn file_name(&self) -> String {
        format!("{}_grid.json", self.as_str())
    }

    /// Static grids have no time axis.
    pub fn is_static(&self) -> bool {
        matches!(self, GridName::Landmask)
    }
}

impl fmt::Display for GridName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for GridName {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| GridError::UnknownGrid(s.to_string()))
    }
}

/// Presence of each grid's record in durable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStatus {
    pub wind: bool,
    pub current: bool,
    pub temperature: bool,
    pub landmask: bool,
}

impl GridStatus {
    pub fn get(&self, name: GridName) -> bool {
        match name {
            GridName::Wind => self.wind,
            GridName::Current => self.current,
            GridName::Temperature => self.temperature,
            GridName::Landmask => self.landmask,
        }
    }

    pub fn set(&mut self, name: GridName, available: bool) {
        match name {
            GridName::Wind => self.wind = available,
            GridName::Current => self.current = available,
            GridName::Temperature => self.temperature = available,
            GridName::Landmask => self.landmask = available,
        }
    }

    /// Names whose records are present.
    pub fn available(&self) -> Vec<GridName> {
        GridName::ALL.into_iter().filter(|n| self.get(*n)).collect()
    }
}

/// Dimensions of a canonical grid and the row-major index formula.
///
/// Time-varying grids index `(t, i, j)` as `t*nLat*nLon + i*nLon + j`;
/// static grids index `(i, j)` as `i*nLon + j`. Consumers depend on this
/// layout, so it must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub n_time: Option<usize>,
    pub n_lat: usize,
    pub n_lon: usize,
}

impl GridLayout {
    pub fn time_varying(n_time: usize, n_lat: usize, n_lon: usize) -> Self {
        Self {
            n_time: Some(n_time),
            n_lat,
            n_lon,
        }
    }

    pub fn static_grid(n_lat: usize, n_lon: usize) -> Self {
        Self {
            n_time: None,
            n_lat,
            n_lon,
        }
    }

    /// Build a layout from a record's `shape` array.
    pub fn from_shape(shape: &[usize]) -> Option<Self> {
        match *shape {
            [n_time, n_lat, n_lon] => Some(Self::time_varying(n_time, n_lat, n_lon)),
            [n_lat, n_lon] => Some(Self::static_grid(n_lat, n_lon)),
            _ => None,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self.n_time {
            Some(n_time) => vec![n_time, self.n_lat, self.n_lon],
            None => vec![self.n_lat, self.n_lon],
        }
    }

    /// Number of values a variable must hold.
    pub fn len(&self) -> usize {
        self.n_time.unwrap_or(1) * self.n_lat * self.n_lon
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear index of element `(t, i, j)`. `t` is ignored for static grids.
    pub fn flat_index(&self, t: usize, i: usize, j: usize) -> usize {
        let plane = self.n_lat * self.n_lon;
        match self.n_time {
            Some(_) => t * plane + i * self.n_lon + j,
            None => i * self.n_lon + j,
        }
    }

    /// Inverse of [`GridLayout::flat_index`].
    pub fn unravel(&self, index: usize) -> (usize, usize, usize) {
        let plane = self.n_lat * self.n_lon;
        let t = if self.n_time.is_some() { index / plane } else { 0 };
        let rem = index % plane;
        (t, rem / self.n_lon, rem % self.n_lon)
    }
}
