//! HTTP handlers for form calculations that need no stored data

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{elapsed_seconds_str, format_duration, CoreError, WeighbridgeReading, WeighingField};

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MbrtDurationRequest {
    pub start: String,
    pub end: String,
}

/// Duration of an MBRT test; an inverted range clears the output and warns
#[derive(Debug, Serialize)]
pub struct MbrtDurationResponse {
    pub seconds: Option<i64>,
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NetWeightRequest {
    #[serde(flatten)]
    pub reading: WeighbridgeReading,
    pub field: WeighingField,
    pub value: Decimal,
    #[serde(default)]
    pub kg_per_litre: Option<Decimal>,
}

/// Elapsed time between the MBRT start and end readings
pub async fn mbrt_duration(Json(input): Json<MbrtDurationRequest>) -> AppResult<Json<MbrtDurationResponse>> {
    match elapsed_seconds_str(&input.start, &input.end) {
        Ok(seconds) => Ok(Json(MbrtDurationResponse {
            seconds: Some(seconds),
            duration: Some(format_duration(seconds)),
            message: None,
        })),
        Err(err @ CoreError::InvalidRange { .. }) => {
            tracing::warn!(start = %input.start, end = %input.end, "MBRT end time before start time");
            Ok(Json(MbrtDurationResponse {
                seconds: None,
                duration: None,
                message: Some(err.to_string()),
            }))
        }
        Err(err) => Err(err.into()),
    }
}

/// Record a weighbridge reading and refresh the net weight
pub async fn net_weight(
    State(state): State<AppState>,
    Json(input): Json<NetWeightRequest>,
) -> AppResult<Json<WeighbridgeReading>> {
    let kg_per_litre = input.kg_per_litre.unwrap_or(state.config.milk.kg_per_litre);
    let mut reading = input.reading;
    reading.record(input.field, input.value, kg_per_litre);
    Ok(Json(reading))
}
