//! Synthetic environmental conditions as a smooth function of time.

use axum::{extract::Query, http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};

use super::common::json_response;

#[derive(Debug, Default, Deserialize)]
pub struct EnvironmentQuery {
    /// Simulation time in seconds.
    pub time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector {
    /// m/s
    pub speed: f64,
    /// Degrees, `[0, 360)`.
    pub direction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub wind: Vector,
    pub current: Vector,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Metres.
    pub wave_height: f64,
}

impl Environment {
    pub fn at(t: f64) -> Self {
        Self {
            wind: Vector {
                speed: 5.0 + 3.0 * (t * 0.001).sin(),
                direction: (180.0 + 30.0 * (t * 0.0005).sin()).rem_euclid(360.0),
            },
            current: Vector {
                speed: 0.3 + 0.15 * (t * 0.0008).sin(),
                direction: (90.0 + 20.0 * (t * 0.0003).cos()).rem_euclid(360.0),
            },
            temperature: 18.0 + 5.0 * (t * 0.0001).sin(),
            wave_height: 0.5 + 0.3 * (t * 0.0006).sin(),
        }
    }
}

/// GET /api/environment?time={t}
pub async fn environment_handler(Query(query): Query<EnvironmentQuery>) -> Response {
    json_response(StatusCode::OK, &Environment::at(query.time.unwrap_or(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_at_zero() {
        let env = Environment::at(0.0);
        assert_eq!(env.wind.speed, 5.0);
        assert_eq!(env.wind.direction, 180.0);
        assert_eq!(env.current.speed, 0.3);
        assert_eq!(env.current.direction, 110.0);
        assert_eq!(env.temperature, 18.0);
        assert_eq!(env.wave_height, 0.5);
    }

    #[test]
    fn test_environment_ranges() {
        for step in 0..200 {
            let env = Environment::at(step as f64 * 997.0);
            assert!((2.0..=8.0).contains(&env.wind.speed));
            assert!((0.0..360.0).contains(&env.wind.direction));
            assert!((0.0..360.0).contains(&env.current.direction));
            assert!((13.0..=23.0).contains(&env.temperature));
        }
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(Environment::at(1000.0)).unwrap();
        assert!(json.get("waveHeight").is_some());
        assert!(json["wind"].get("direction").is_some());
    }
}
