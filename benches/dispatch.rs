//! Inbound dispatch benchmark suite.
//!
//! Measures the per-frame path a busy dashboard sees:
//! - Envelope parsing for small and large payloads
//! - Registry fan-out at different listener counts
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

use chargeflow_live::Envelope;
use chargeflow_live::registry::Registry;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 8, 64];
const CHARGER_COUNTS: &[usize] = &[1, 50, 500];

// ============================================================================
// Fixtures
// ============================================================================

fn metrics_frame(chargers: usize) -> String {
    let bays: Vec<Value> = (0..chargers)
        .map(|id| json!({ "chargerId": id, "status": "charging", "powerKw": 48.5 }))
        .collect();

    json!({
        "type": "metrics_update",
        "payload": { "currentQueue": 4, "utilization": 0.82, "chargers": bays }
    })
    .to_string()
}

// ============================================================================
// Benchmark: Envelope Parse
// ============================================================================

fn bench_envelope_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_parse");

    for &chargers in CHARGER_COUNTS {
        let frame = metrics_frame(chargers);
        group.bench_with_input(BenchmarkId::new("metrics", chargers), &frame, |b, frame| {
            b.iter(|| Envelope::parse(black_box(frame)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Registry Emit
// ============================================================================

fn bench_registry_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_emit");
    let payload = json!({ "chargerId": 7, "updates": { "status": "idle" } });

    for &count in LISTENER_COUNTS {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..count {
            let hits = Arc::clone(&hits);
            registry.add(
                "charger_update",
                Arc::new(move |_: &Value| {
                    hits.fetch_add(1, Ordering::Relaxed);
                }),
            );
        }

        group.bench_with_input(BenchmarkId::new("listeners", count), &count, |b, _| {
            b.iter(|| registry.emit(black_box("charger_update"), black_box(&payload)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope_parse, bench_registry_emit);
criterion_main!(benches);
