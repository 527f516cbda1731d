//! Fixed catalog of oil-spill incident scenarios.

use axum::{http::StatusCode, response::Response};
use serde::Serialize;

use super::common::json_response;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: u32,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    /// Released volume in cubic metres.
    pub oil_volume: u32,
    pub oil_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spill_mode: Option<&'static str>,
    /// Hours of release for continuous spills.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spill_duration: Option<u32>,
    pub description: &'static str,
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: 1,
            name: "Bohai Bay oil spill",
            lat: 38.5,
            lng: 119.0,
            oil_volume: 500,
            oil_type: "crude",
            spill_mode: None,
            spill_duration: None,
            description: "Crude oil release in Bohai Bay",
        },
        Scenario {
            id: 2,
            name: "South China Sea platform leak",
            lat: 19.5,
            lng: 112.0,
            oil_volume: 1000,
            oil_type: "crude",
            spill_mode: None,
            spill_duration: None,
            description: "Drilling platform spill in the South China Sea",
        },
        Scenario {
            id: 3,
            name: "East China Sea tanker accident",
            lat: 30.0,
            lng: 124.0,
            oil_volume: 2000,
            oil_type: "fuel",
            spill_mode: None,
            spill_duration: None,
            description: "Tanker collision spill in the East China Sea",
        },
        Scenario {
            id: 4,
            name: "Continuous pipeline leak",
            lat: 37.8,
            lng: 120.5,
            oil_volume: 800,
            oil_type: "crude",
            spill_mode: Some("continuous"),
            spill_duration: Some(12),
            description: "Subsea pipeline leaking continuously for 12 hours",
        },
    ]
}

/// GET /api/scenarios
pub async fn scenarios_handler() -> Response {
    json_response(StatusCode::OK, &scenarios())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_json_shape() {
        let json = serde_json::to_value(scenarios()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 4);
        assert_eq!(json[0]["oilVolume"], 500);
        assert!(json[0].get("spillMode").is_none());
        assert_eq!(json[3]["spillMode"], "continuous");
        assert_eq!(json[3]["spillDuration"], 12);
        assert_eq!(json[2]["oilType"], "fuel");
    }

    #[test]
    fn test_handler_status() {
        let response = tokio_test::block_on(scenarios_handler());
        assert_eq!(response.status(), StatusCode::OK);
    }
}
