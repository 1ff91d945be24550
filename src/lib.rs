//! Fare Engine for local and outstation vehicle bookings
//!
//! This crate computes booking fares from trip inputs and a vehicle model's
//! rate card, rolls bookings up into customer invoices, and settles what is
//! owed to drivers. The calculation layer is pure; the [`host`] module runs
//! serialized recompute cycles against a pluggable record store, and the
//! [`api`] module exposes stateless quote endpoints over HTTP.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
