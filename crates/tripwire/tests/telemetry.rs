// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(all(feature = "logs", feature = "metrics"))]

//! Telemetry emitted by the breaker when metrics and logs are enabled.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyspawn::Spawner;
use layered::{Execute, Layer};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics, ScopeMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
use tick::Clock;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tripwire::telemetry::{CIRCUIT_STATE, EVENT_NAME, PIPELINE_NAME, STRATEGY_NAME};
use tripwire::{Breaker, BreakerContext};

#[derive(Clone, Default)]
struct Logs(Arc<Mutex<Vec<u8>>>);

impl Logs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for Logs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Logs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn attributes(exporter: &InMemoryMetricExporter, provider: &SdkMeterProvider) -> Vec<KeyValue> {
    provider.force_flush().unwrap();

    exporter
        .get_finished_metrics()
        .unwrap()
        .iter()
        .flat_map(ResourceMetrics::scope_metrics)
        .flat_map(ScopeMetrics::metrics)
        .flat_map(|metric| match metric.data() {
            AggregatedMetrics::U64(MetricData::Sum(sum)) => {
                sum.data_points().flat_map(|point| point.attributes().cloned()).collect::<Vec<_>>()
            }
            _ => Vec::new(),
        })
        .collect()
}

#[tokio::test]
async fn open_and_reject_are_reported() {
    let exporter = InMemoryMetricExporter::default();
    let provider = SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build();
    let logs = Logs::default();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(logs.clone()).with_ansi(false)),
    );

    let clock = Clock::new_frozen();
    let context = BreakerContext::new(&clock, Spawner::new_tokio())
        .name("checkout")
        .enable_metrics(&provider)
        .enable_logs();
    let breaker = Breaker::layer("payments", &context)
        .trial_probability(0.0)
        .layer(Execute::new(|amount: u32| async move { Ok::<_, String>(amount) }));

    breaker.open().unwrap();
    let error = breaker.invoke(10).await.unwrap_err();
    assert!(error.is_no_failover());

    let attributes = attributes(&exporter, &provider);
    for expected in [
        KeyValue::new(PIPELINE_NAME, "checkout"),
        KeyValue::new(STRATEGY_NAME, "payments"),
        KeyValue::new(EVENT_NAME, "circuit_opened"),
        KeyValue::new(EVENT_NAME, "call_rejected"),
        KeyValue::new(CIRCUIT_STATE, "open"),
    ] {
        assert!(attributes.contains(&expected), "{expected:?} not found in {attributes:?}");
    }

    let text = logs.text();
    assert!(text.contains("WARN"), "{text}");
    assert!(text.contains("pipeline.name=checkout"), "{text}");
    assert!(text.contains("breaker.id=payments"), "{text}");
    assert!(text.contains("breaker.state=\"open\""), "{text}");
}

#[tokio::test]
async fn close_is_reported_at_info() {
    let logs = Logs::default();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(logs.clone()).with_ansi(false)),
    );

    let clock = Clock::new_frozen();
    let context = BreakerContext::new(&clock, Spawner::new_tokio()).enable_logs();
    let breaker: Breaker<u32, u32, String, _> =
        Breaker::layer("payments", &context).layer(Execute::new(|amount: u32| async move { Ok::<_, String>(amount) }));

    breaker.open().unwrap();
    breaker.close().unwrap();

    let text = logs.text();
    assert!(text.contains("INFO"), "{text}");
    assert!(text.contains("breaker.state=\"closed\""), "{text}");
}

#[tokio::test]
async fn disabled_telemetry_is_silent() {
    let logs = Logs::default();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(logs.clone()).with_ansi(false)),
    );

    let clock = Clock::new_frozen();
    let context = BreakerContext::new(&clock, Spawner::new_tokio());
    let breaker = Breaker::layer("payments", &context).layer(Execute::new(|amount: u32| async move { Ok::<_, String>(amount) }));

    breaker.open().unwrap();
    let _ = breaker.invoke(10).await;

    assert!(logs.text().is_empty());
}
