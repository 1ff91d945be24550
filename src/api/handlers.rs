//! HTTP request handlers for the fare engine API.
//!
//! Every endpoint is stateless: it prices what it is given, or reads the
//! fleet configuration, and stores nothing. Booking persistence goes
//! through [`crate::host`].

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{calculate_invoice_totals, recompute_booking, resolve_rates};
use crate::error::EngineError;
use crate::models::{Booking, BookingCalculation};

use super::request::{InvoiceTotalsRequest, QuoteRequest};
use super::response::{ApiError, ApiErrorResponse, InvoiceTotalsResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/bookings/quote", post(quote_handler))
        .route("/invoices/totals", post(invoice_totals_handler))
        .route("/vehicle-models/:id", get(vehicle_model_handler))
        .with_state(state)
}

/// Handler for POST /bookings/quote.
///
/// Prices a booking. An unknown or missing vehicle model is not an error:
/// the quote is computed with whatever rates the request carried and the
/// problem is reported as an advisory.
async fn quote_handler(
    State(state): State<AppState>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing quote request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = match quote(&state, &request) {
        Ok(result) => result,
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Quote failed"
            );
            return error_response(err);
        }
    };
    let duration = start_time.elapsed();

    info!(
        correlation_id = %correlation_id,
        booking_id = %result.booking_id,
        booking_type = %result.booking_type,
        grand_total = %result.derived.grand_total,
        advisories = result.advisories().len(),
        duration_us = duration.as_micros(),
        "Quote completed"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(result),
    )
        .into_response()
}

/// Handler for POST /invoices/totals.
async fn invoice_totals_handler(
    State(_state): State<AppState>,
    payload: Result<Json<InvoiceTotalsRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing invoice totals request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = calculate_invoice_totals(&request.lines, request.discount, request.paid_amount, 1);
    info!(
        correlation_id = %correlation_id,
        lines = request.lines.len(),
        payable_amount = %result.totals.payable_amount,
        "Invoice totals completed"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(InvoiceTotalsResponse {
            totals: result.totals,
            audit_step: result.audit_step,
        }),
    )
        .into_response()
}

/// Handler for GET /vehicle-models/:id.
///
/// Returns a vehicle model with its published rate card.
async fn vehicle_model_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    match state.config().get_vehicle_model(&id) {
        Ok(model) => {
            info!(correlation_id = %correlation_id, vehicle_model = %id, "Vehicle model served");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(model.clone()),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                vehicle_model = %id,
                "Vehicle model not found"
            );
            error_response(err)
        }
    }
}

/// Resolves rates when the request did not carry them, then recomputes.
fn quote(state: &AppState, request: &QuoteRequest) -> Result<BookingCalculation, EngineError> {
    let mut booking: Booking = request.to_booking();

    let resolution = if request.rates.is_none() {
        let card = match booking.vehicle_model.as_deref() {
            Some(model) => match state.config().get_rate_card(model) {
                Ok(card) => Some(card),
                // Priced with the request's own rates; the resolver reports it
                Err(EngineError::VehicleModelNotFound { .. }) => None,
                Err(err) => return Err(err),
            },
            None => None,
        };
        let resolution = resolve_rates(
            booking.booking_type,
            booking.vehicle_model.as_deref(),
            card,
            &booking.rates,
            0,
        );
        booking.rates = resolution.rates.clone();
        Some(resolution)
    } else {
        None
    };

    let mut calculation = recompute_booking(&booking);
    if let Some(resolution) = resolution {
        calculation.audit_trace.steps.insert(0, resolution.audit_step);
        let mut advisories = resolution.advisories;
        advisories.append(&mut calculation.audit_trace.advisories);
        calculation.audit_trace.advisories = advisories;
    }
    Ok(calculation)
}

fn error_response(err: EngineError) -> Response {
    let api_error: ApiErrorResponse = err.into();
    (
        api_error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(api_error.error),
    )
        .into_response()
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}
