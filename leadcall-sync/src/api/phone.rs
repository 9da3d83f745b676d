//! Phone number check used by lead entry forms

use axum::{routing::post, Json, Router};
use leadcall_common::phone::{format, normalize, validate_indian_mobile};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidatePhoneRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePhoneResponse {
    pub is_valid: bool,
    pub message: String,
    /// Input after [`format`]; what the form should store
    pub formatted: String,
    /// Matching key used by the reconciler
    pub normalized: String,
}

/// POST /api/phone/validate
///
/// Formats the raw input first, then validates the formatted value, so a
/// bare `98765 43210` is reported valid as `+919876543210`. An invalid number
/// is a 200 with `isValid: false`. A malformed body is rejected by the
/// extractor before reaching here.
pub async fn validate_phone(
    Json(request): Json<ValidatePhoneRequest>,
) -> ApiResult<Json<ValidatePhoneResponse>> {
    if request.phone.len() > 64 {
        return Err(ApiError::BadRequest("phone must be at most 64 characters".to_string()));
    }

    let formatted = format(&request.phone);
    let validation = validate_indian_mobile(&formatted);

    Ok(Json(ValidatePhoneResponse {
        is_valid: validation.is_valid,
        message: validation.message,
        normalized: normalize(&formatted),
        formatted,
    }))
}

pub fn phone_routes() -> Router<AppState> {
    Router::new().route("/api/phone/validate", post(validate_phone))
}
