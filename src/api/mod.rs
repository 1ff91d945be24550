//! HTTP API module for the fare engine.
//!
//! This module exposes stateless quote and invoice-totals endpoints over
//! the pure calculation layer.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{InvoiceTotalsRequest, QuoteRequest};
pub use response::{ApiError, InvoiceTotalsResponse};
pub use state::AppState;
