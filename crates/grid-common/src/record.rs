//! The canonical grid record: the JSON document persisted by the pipeline
//! and served verbatim to clients.
//!
//! ```text
//! time-varying: {"lat":[..],"lon":[..],"time_hours":[..],"shape":[nT,nLat,nLon],"uo":[..],"vo":[..]}
//! static:       {"lat":[..],"lon":[..],"shape":[nLat,nLon],"lsm":[..]}
//! ```
//!
//! Keys are always written in the order above, variables in encode order,
//! so encoding the same input twice produces identical bytes.

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::{GridError, GridLayout, GridResult};

const RESERVED_KEYS: [&str; 4] = ["lat", "lon", "time_hours", "shape"];

/// One named field, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GridVariable {
    pub name: String,
    pub values: Vec<f64>,
}

/// Canonical grid record with ascending coordinates and flat variables.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRecord {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Hours since the first timestamp; `None` for static grids.
    pub time_hours: Option<Vec<f64>>,
    pub shape: Vec<usize>,
    pub variables: Vec<GridVariable>,
}

impl GridRecord {
    pub fn layout(&self) -> Option<GridLayout> {
        GridLayout::from_shape(&self.shape)
    }

    pub fn variable(&self, name: &str) -> Option<&[f64]> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.values.as_slice())
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Read a value through the documented index formula.
    pub fn value_at(&self, variable: &str, t: usize, i: usize, j: usize) -> Option<f64> {
        let layout = self.layout()?;
        let values = self.variable(variable)?;
        values.get(layout.flat_index(t, i, j)).copied()
    }

    /// Check the record invariants: shape matches the coordinate arrays,
    /// every variable holds exactly `product(shape)` values, and both
    /// coordinate arrays are strictly ascending.
    pub fn validate(&self) -> GridResult<()> {
        let layout = self
            .layout()
            .ok_or_else(|| GridError::InvalidRecord(format!("unsupported shape {:?}", self.shape)))?;

        if layout.n_lat != self.lat.len() || layout.n_lon != self.lon.len() {
            return Err(GridError::InvalidRecord(format!(
                "shape {:?} does not match {} latitudes x {} longitudes",
                self.shape,
                self.lat.len(),
                self.lon.len()
            )));
        }

        match (&self.time_hours, layout.n_time) {
            (Some(hours), Some(n_time)) if hours.len() == n_time => {}
            (None, None) => {}
            _ => {
                return Err(GridError::InvalidRecord(format!(
                    "time axis does not match shape {:?}",
                    self.shape
                )))
            }
        }

        for (axis, values) in [("lat", &self.lat), ("lon", &self.lon)] {
            if values.windows(2).any(|w| w[0] >= w[1]) {
                return Err(GridError::InvalidRecord(format!("{} is not strictly ascending", axis)));
            }
        }

        for variable in &self.variables {
            if variable.values.len() != layout.len() {
                return Err(GridError::LengthMismatch {
                    variable: variable.name.clone(),
                    shape: self.shape.clone(),
                    expected: layout.len(),
                    actual: variable.values.len(),
                });
            }
        }

        Ok(())
    }

    /// Compact JSON bytes, as persisted and served.
    pub fn to_json_bytes(&self) -> GridResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> GridResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Serialize for GridRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fixed = if self.time_hours.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(fixed + self.variables.len()))?;
        map.serialize_entry("lat", &self.lat)?;
        map.serialize_entry("lon", &self.lon)?;
        if let Some(hours) = &self.time_hours {
            map.serialize_entry("time_hours", hours)?;
        }
        map.serialize_entry("shape", &self.shape)?;
        for variable in &self.variables {
            map.serialize_entry(&variable.name, &variable.values)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawRecord {
    lat: Vec<f64>,
    lon: Vec<f64>,
    #[serde(default)]
    time_hours: Option<Vec<f64>>,
    shape: Vec<usize>,
    #[serde(flatten)]
    variables: serde_json::Map<String, serde_json::Value>,
}

impl<'de> Deserialize<'de> for GridRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRecord::deserialize(deserializer)?;
        let mut variables = Vec::with_capacity(raw.variables.len());
        for (name, value) in raw.variables {
            if RESERVED_KEYS.contains(&name.as_str()) {
                continue;
            }
            let values: Vec<f64> = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("variable {}: {}", name, e)))?;
            variables.push(GridVariable { name, values });
        }
        Ok(GridRecord {
            lat: raw.lat,
            lon: raw.lon,
            time_hours: raw.time_hours,
            shape: raw.shape,
            variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> GridRecord {
        GridRecord {
            lat: vec![36.0, 37.0],
            lon: vec![118.0, 119.0, 120.0],
            time_hours: Some(vec![0.0, 6.0]),
            shape: vec![2, 2, 3],
            variables: vec![
                GridVariable {
                    name: "uo".to_string(),
                    values: (0..12).map(|v| v as f64 * 0.5).collect(),
                },
                GridVariable {
                    name: "vo".to_string(),
                    values: vec![0.0; 12],
                },
            ],
        }
    }

    #[test]
    fn test_serialized_key_order() {
        let json = String::from_utf8(sample_record().to_json_bytes().unwrap()).unwrap();
        assert!(json.starts_with(r#"{"lat":[36.0,37.0],"lon":[118.0,119.0,120.0],"time_hours":[0.0,6.0],"shape":[2,2,3],"uo":["#));
        assert!(json.find("\"uo\"").unwrap() < json.find("\"vo\"").unwrap());
        assert!(!json.contains(' '));
    }

    #[test]
    fn test_static_record_has_no_time_key() {
        let record = GridRecord {
            lat: vec![36.0],
            lon: vec![118.0, 118.5],
            time_hours: None,
            shape: vec![1, 2],
            variables: vec![GridVariable {
                name: "lsm".to_string(),
                values: vec![1.0, 0.0],
            }],
        };
        let json = String::from_utf8(record.to_json_bytes().unwrap()).unwrap();
        assert_eq!(json, r#"{"lat":[36.0],"lon":[118.0,118.5],"shape":[1,2],"lsm":[1.0,0.0]}"#);
        record.validate().unwrap();
    }

    #[test]
    fn test_parse_back() {
        let record = sample_record();
        let parsed = GridRecord::from_json_slice(&record.to_json_bytes().unwrap()).unwrap();
        assert_eq!(parsed.shape, vec![2, 2, 3]);
        assert_eq!(parsed.variable_names(), vec!["uo", "vo"]);
        assert_eq!(parsed.value_at("uo", 1, 1, 2), Some(5.5));
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let mut record = sample_record();
        record.variables[1].values.pop();
        assert!(matches!(
            record.validate(),
            Err(GridError::LengthMismatch { expected: 12, actual: 11, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_descending_latitude() {
        let mut record = sample_record();
        record.lat.reverse();
        assert!(record.validate().is_err());
    }
}
