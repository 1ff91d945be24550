//! Performance benchmarks for the fare engine.
//!
//! Covers the pure booking recompute, tax-line scaling, the quote endpoint
//! end to end, and a batch of engine cycles against the in-memory store.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use fare_engine::api::{AppState, QuoteRequest, create_router};
use fare_engine::calculation::{calculate_invoice_totals, recompute_booking};
use fare_engine::config::ConfigLoader;
use fare_engine::host::{EngineSettings, MemoryStore, RecomputeEngine};
use fare_engine::models::{
    ApplyOn, Booking, BookingMutation, BookingType, ExpenseLine, InvoiceLine, PaidBy, Record,
    TaxLine,
};

use axum::{body::Body, http::Request};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tower::ServiceExt;

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/fleet").expect("Failed to load config")
}

fn make_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// An outstation booking with `tax_count` tax lines and a few expenses.
fn create_booking(id: &str, tax_count: usize) -> Booking {
    let mut booking = Booking::new(id, BookingType::Outstation);
    booking.inputs.pickup_at = Some(make_datetime("2026-03-02 06:00:00"));
    booking.inputs.return_at = Some(make_datetime("2026-03-05 21:00:00"));
    booking.inputs.start_km = Some(Decimal::new(10_250, 0));
    booking.inputs.end_km = Some(Decimal::new(11_420, 0));
    booking.rates.per_km_rate = Decimal::new(12, 0);
    booking.rates.night_rate = Decimal::new(300, 0);
    booking.rates.min_km_per_day = Decimal::new(250, 0);
    booking.tax_lines = (0..tax_count)
        .map(|i| {
            let apply_on = if i % 2 == 0 { ApplyOn::Actual } else { ApplyOn::PrevRow };
            TaxLine::new(apply_on, Decimal::new(50 + i as i64, 0))
        })
        .collect();
    booking.expense_lines = vec![
        ExpenseLine::new("Toll", Decimal::new(480, 0), true, PaidBy::Driver),
        ExpenseLine::new("Parking", Decimal::new(60, 0), true, PaidBy::Customer),
        ExpenseLine::new("Driver food", Decimal::new(450, 0), false, PaidBy::Driver),
    ];
    booking
}

/// Benchmark: Single booking recompute.
fn bench_recompute_booking(c: &mut Criterion) {
    let booking = create_booking("BK-BENCH", 3);

    c.bench_function("recompute_booking", |b| {
        b.iter(|| black_box(recompute_booking(black_box(&booking))))
    });
}

/// Benchmark: Recompute cost as the tax collection grows.
fn bench_tax_line_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("tax_lines");

    for tax_count in [0usize, 1, 4, 16, 64].iter() {
        let booking = create_booking("BK-BENCH", *tax_count);
        group.throughput(Throughput::Elements(*tax_count as u64));
        group.bench_with_input(BenchmarkId::new("lines", tax_count), tax_count, |b, _| {
            b.iter(|| black_box(recompute_booking(&booking)))
        });
    }

    group.finish();
}

/// Benchmark: Invoice totals over 100 lines.
fn bench_invoice_totals(c: &mut Criterion) {
    let lines: Vec<InvoiceLine> = (0..100)
        .map(|i| {
            let mut line = InvoiceLine::new(BookingType::Local, format!("BK-{:05}", i));
            line.amount = Decimal::new(1_300 + i, 0);
            line
        })
        .collect();

    c.bench_function("invoice_totals_100_lines", |b| {
        b.iter(|| {
            black_box(calculate_invoice_totals(
                &lines,
                Decimal::new(500, 0),
                Decimal::new(10_000, 0),
                1,
            ))
        })
    });
}

/// Benchmark: Quote request through the HTTP router.
fn bench_quote_endpoint(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(load_config()));
    let request: QuoteRequest = serde_json::from_value(serde_json::json!({
        "booking_id": "Q-BENCH",
        "booking_type": "outstation",
        "vehicle_model": "sedan",
        "inputs": {
            "pickup_at": "2026-03-02T06:00:00",
            "return_at": "2026-03-05T21:00:00",
            "start_km": "10250",
            "end_km": "11420"
        },
        "tax_lines": [{"apply_on": "Actual", "amount": "375"}]
    }))
    .expect("Failed to create request");
    let body = serde_json::to_string(&request).unwrap();

    c.bench_function("quote_endpoint", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/bookings/quote")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: 100 engine cycles, each on its own booking.
fn bench_engine_batch_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = load_config();
    let store = Arc::new(MemoryStore::with_config(&config));
    rt.block_on(async {
        for i in 0..100 {
            store
                .insert(Record::Booking(create_booking(&format!("BK-{:05}", i), 2)))
                .await;
        }
    });
    let engine = RecomputeEngine::new(store, EngineSettings::from(config.settlement()));

    let mut group = c.benchmark_group("engine_batch");
    group.throughput(Throughput::Elements(100));
    group.sample_size(20);

    group.bench_function("cycles_100", |b| {
        b.to_async(&rt).iter(|| async {
            let mut outcomes = Vec::with_capacity(100);
            for i in 0..100 {
                let outcome = engine
                    .apply(
                        &format!("BK-{:05}", i),
                        vec![BookingMutation::SetVehicleModel {
                            value: Some(if i % 2 == 0 { "sedan" } else { "suv" }.to_string()),
                        }],
                    )
                    .await
                    .unwrap();
                outcomes.push(outcome);
            }
            black_box(outcomes)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_recompute_booking,
    bench_tax_line_scaling,
    bench_invoice_totals,
    bench_quote_endpoint,
    bench_engine_batch_100,
);
criterion_main!(benches);
