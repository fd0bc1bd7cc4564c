//! calldec metrics definitions.
//!
//! All metrics use OpenTelemetry conventions. Without an installed
//! `MeterProvider` the instruments are no-ops.

use calldec_core::{call::DecodedCall, decoder::BatchDecodeResult, error::DecodeError};
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

/// Central metrics handle for the call decoder.
#[derive(Clone)]
pub struct CallDecoderMetrics {
    pub calls_decoded: Counter<u64>,
    pub unknown_selectors: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub decode_latency_ms: Histogram<f64>,
    pub batch_size: Histogram<u64>,
}

impl CallDecoderMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            calls_decoded: meter
                .u64_counter("calldec.calls_decoded")
                .with_description("Calls decoded against a known selector")
                .build(),
            unknown_selectors: meter
                .u64_counter("calldec.unknown_selectors")
                .with_description("Calls whose selector matched no ABI function")
                .build(),
            decode_errors: meter
                .u64_counter("calldec.decode_errors")
                .with_description("Calldata payloads that failed to decode")
                .build(),
            decode_latency_ms: meter
                .f64_histogram("calldec.decode_latency_ms")
                .with_description("Time to decode a single payload in milliseconds")
                .build(),
            batch_size: meter
                .u64_histogram("calldec.batch_size")
                .with_description("Number of payloads in a batch decode request")
                .build(),
        }
    }

    /// Metrics on the global meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("calldec"))
    }

    /// Count a decoded call; unknown selectors go to their own counter.
    pub fn record_call(&self, call: &DecodedCall) {
        if call.is_unknown() {
            self.unknown_selectors
                .add(1, &[KeyValue::new("selector", call.selector_hex())]);
        } else {
            self.calls_decoded.add(
                1,
                &[KeyValue::new("function", call.function_name().to_string())],
            );
        }
    }

    pub fn record_error(&self, error: &DecodeError) {
        self.decode_errors
            .add(1, &[KeyValue::new("error_type", error.kind())]);
    }

    /// Record the outcome of one decode and how long it took.
    pub fn record_result(&self, result: &Result<DecodedCall, DecodeError>, elapsed: Duration) {
        match result {
            Ok(call) => self.record_call(call),
            Err(e) => self.record_error(e),
        }
        self.decode_latency_ms.record(elapsed.as_secs_f64() * 1_000.0, &[]);
    }

    pub fn record_batch(&self, result: &BatchDecodeResult) {
        self.batch_size.record(result.total_input as u64, &[]);
        for (_, call) in &result.calls {
            self.record_call(call);
        }
        for (_, err) in &result.errors {
            self.record_error(err);
        }
    }
}
