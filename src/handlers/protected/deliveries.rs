use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Delivery, DeliveryStatus, DeliveryUpdate, NewDelivery};
use crate::services::DeliveryFilter;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub patient_id: Option<u64>,
}

/// Invoice block as older clients send it: `{"number": ..., "emission_date": ...}`
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceRequest {
    pub number: Option<String>,
    pub emission_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliveryRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub emission_date: Option<String>,
    #[serde(default)]
    pub invoice: Option<InvoiceRequest>,
}

impl UpdateDeliveryRequest {
    fn into_update(self) -> Result<DeliveryUpdate, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => return Err(ApiError::invalid_field("status", "This field is required")),
            Some(raw) => parse_status(raw)?,
        };

        let invoice = self.invoice.unwrap_or_default();
        let invoice_number = self.invoice_number.or(invoice.number);
        let emission_date = match self.emission_date.or(invoice.emission_date) {
            Some(raw) if !raw.trim().is_empty() => Some(parse_emission_date(&raw)?),
            _ => None,
        };

        Ok(DeliveryUpdate {
            status,
            invoice_number,
            emission_date,
        })
    }
}

fn parse_status(raw: &str) -> Result<DeliveryStatus, ApiError> {
    raw.parse::<DeliveryStatus>()
        .map_err(|e| ApiError::invalid_field("status", e.to_string()))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its date part is kept)
fn parse_emission_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| {
            ApiError::invalid_field(
                "emission_date",
                format!("'{}' is not a date (expected YYYY-MM-DD)", raw),
            )
        })
}

/// POST /deliveries - open a pending delivery for a patient
///
/// Input: `{"patient_id": 1}`
pub async fn create_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewDelivery>, JsonRejection>,
) -> ApiResult<Delivery> {
    let Json(fields) = payload?;
    let delivery = state.service.create_delivery(fields).await?;
    tracing::info!(
        user = %user.username,
        delivery_id = delivery.id,
        patient_id = delivery.patient_id,
        "Created delivery"
    );
    Ok(ApiResponse::created(delivery))
}

/// GET /deliveries?status=pending&patient_id=1 - deliveries in creation order
pub async fn list_deliveries(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Delivery>> {
    let Query(query) = query?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };

    let filter = DeliveryFilter {
        status,
        patient_id: query.patient_id,
    };
    Ok(ApiResponse::success(state.service.list_deliveries(filter).await))
}

/// GET /deliveries/:id
pub async fn get_delivery(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Delivery> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.service.get_delivery(id).await?))
}

/// PATCH|PUT /deliveries/:id - advance the status, recording the invoice on delivery
///
/// Input:
/// ```json
/// { "status": "delivered", "invoice_number": "NF001", "emission_date": "2024-01-01" }
/// ```
pub async fn update_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateDeliveryRequest>, JsonRejection>,
) -> ApiResult<Delivery> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let update = request.into_update()?;

    let status = update.status;
    let delivery = state.service.update_delivery(id, update).await?;
    tracing::info!(user = %user.username, delivery_id = id, status = %status, "Updated delivery");
    Ok(ApiResponse::success(delivery))
}
