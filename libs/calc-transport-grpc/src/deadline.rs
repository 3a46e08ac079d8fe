//! Caller deadline extraction.
//!
//! A gRPC client announces its deadline in the `grpc-timeout` request header
//! as up to eight ASCII digits followed by a unit (`H`, `M`, `S`, `m`, `u`,
//! `n`). Servers that forward requests can read it to avoid waiting on a
//! downstream hop after their own caller has given up.

use std::time::Duration;

use tonic::metadata::MetadataMap;

/// Header carrying the caller's remaining deadline.
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

const MAX_TIMEOUT_DIGITS: usize = 8;

/// Parse a `grpc-timeout` header value.
///
/// Returns `None` for malformed values.
#[must_use]
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || !value.is_ascii() {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > MAX_TIMEOUT_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

/// Remaining deadline announced by the caller, if any.
#[must_use]
pub fn caller_timeout(metadata: &MetadataMap) -> Option<Duration> {
    let raw = metadata.get(GRPC_TIMEOUT_HEADER)?;
    let value = raw.to_str().ok()?;
    let parsed = parse_grpc_timeout(value);
    if parsed.is_none() {
        tracing::debug!(value, "ignoring malformed grpc-timeout header");
    }
    parsed
}
