//! Metrics collection.
//!
//! # Responsibilities
//! - Define gateway metrics (logins, rejections, transform outcomes)
//! - Keep call sites terse via small named helpers
//!
//! # Metrics
//! - `gateway_logins_total` (counter): login attempts by outcome
//! - `gateway_token_reuse_total` (counter): refresh reuse detections
//! - `gateway_ban_events_total` (counter): ban/unban writes
//! - `gateway_rate_limited_total` (counter): admission rejections by route
//! - `gateway_transforms_total` (counter): transform outcomes
//! - `gateway_transform_fan_in_total` (counter): waiters joining in-flight work
//!
//! # Design Decisions
//! - Low-overhead updates through the `metrics` facade; the recorder is
//!   installed by the embedding process

use metrics::counter;

pub fn record_login(outcome: &'static str) {
    counter!("gateway_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_token_reuse() {
    counter!("gateway_token_reuse_total").increment(1);
}

pub fn record_ban_event(banned: bool) {
    let kind = if banned { "ban" } else { "unban" };
    counter!("gateway_ban_events_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("gateway_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_transform(outcome: &'static str) {
    counter!("gateway_transforms_total", "outcome" => outcome).increment(1);
}

pub fn record_transform_fan_in() {
    counter!("gateway_transform_fan_in_total").increment(1);
}
