//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and addresses.
//! Validation is a pure function returning every problem found, not just the
//! first, so an operator can fix a config file in one pass.

use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("admission.window_secs must be greater than zero")]
    ZeroWindow,
    #[error("admission.max_requests must be greater than zero")]
    ZeroMaxRequests,
    #[error("admission.max_body_bytes must be greater than zero")]
    ZeroBodyCeiling,
    #[error("admission.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,
    #[error("admission.idle_multiplier must be greater than zero")]
    ZeroIdleMultiplier,
    #[error("admission.allowed_methods must not be empty")]
    NoAllowedMethods,
    #[error("admission.allowed_methods contains invalid method '{0}'")]
    InvalidMethod(String),
    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("cors.production_origin must not be empty")]
    EmptyProductionOrigin,
    #[error("observability.log_format '{0}' must be 'pretty' or 'json'")]
    UnknownLogFormat(String),
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("admission.max_raw_body_bytes ({raw}) must be at least admission.max_body_bytes ({ceiling})")]
    RawLimitBelowCeiling { raw: usize, ceiling: usize },
    #[error("{0} cannot change without a restart")]
    RequiresRestart(&'static str),
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let admission = &config.admission;

    if admission.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if admission.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests);
    }
    if admission.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyCeiling);
    }
    if admission.max_raw_body_bytes < admission.max_body_bytes {
        errors.push(ValidationError::RawLimitBelowCeiling {
            raw: admission.max_raw_body_bytes,
            ceiling: admission.max_body_bytes,
        });
    }
    if admission.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if admission.idle_multiplier == 0 {
        errors.push(ValidationError::ZeroIdleMultiplier);
    }
    if admission.allowed_methods.is_empty() {
        errors.push(ValidationError::NoAllowedMethods);
    }
    for method in &admission.allowed_methods {
        if method.trim().is_empty() || Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(upstream) = &config.upstream.address {
        check_address(&mut errors, "upstream.address", upstream);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.cors.production_origin.trim().is_empty() {
        errors.push(ValidationError::EmptyProductionOrigin);
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::UnknownLogFormat(other.to_string())),
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that a reloaded configuration only touches fields applied at runtime.
///
/// The listener, upstream, timeouts, sweep interval and observability setup
/// are fixed when the server starts.
pub fn check_reload(current: &GatewayConfig, next: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fixed = |field: &'static str, changed: bool| {
        if changed {
            errors.push(ValidationError::RequiresRestart(field));
        }
    };

    fixed(
        "listener.bind_address",
        current.listener.bind_address != next.listener.bind_address,
    );
    fixed("upstream.address", current.upstream.address != next.upstream.address);
    fixed(
        "timeouts.request_secs",
        current.timeouts.request_secs != next.timeouts.request_secs,
    );
    fixed(
        "admission.sweep_interval_secs",
        current.admission.sweep_interval_secs != next.admission.sweep_interval_secs,
    );

    let (obs, next_obs) = (&current.observability, &next.observability);
    fixed("observability.log_level", obs.log_level != next_obs.log_level);
    fixed("observability.log_format", obs.log_format != next_obs.log_format);
    fixed(
        "observability.metrics_enabled",
        obs.metrics_enabled != next_obs.metrics_enabled,
    );
    fixed(
        "observability.metrics_address",
        obs.metrics_address != next_obs.metrics_address,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
