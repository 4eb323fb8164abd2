//! Dispatch counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use vtn_core::VtnError;
use vtn_handlers::HandlerError;

/// Outcome counters shared by every service endpoint
#[derive(Debug, Default)]
pub struct DispatchStats {
    dispatched: AtomicU64,
    malformed: AtomicU64,
    authentication_failures: AtomicU64,
    wrong_endpoint: AtomicU64,
    not_implemented: AtomicU64,
    invalid_payload: AtomicU64,
    handler_failures: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub dispatched: u64,
    pub malformed: u64,
    pub authentication_failures: u64,
    pub wrong_endpoint: u64,
    pub not_implemented: u64,
    pub invalid_payload: u64,
    pub handler_failures: u64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a message rejected before dispatch
    pub fn record_rejected(&self, err: &VtnError) {
        if err.is_authentication() {
            self.record_authentication_failure();
        } else {
            self.malformed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_authentication_failure(&self) {
        self.authentication_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wrong_endpoint(&self) {
        self.wrong_endpoint.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_implemented(&self) {
        self.not_implemented.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_error(&self, err: &HandlerError) {
        let counter = match err {
            HandlerError::NotImplemented(_) => &self.not_implemented,
            HandlerError::InvalidPayload(_) => &self.invalid_payload,
            HandlerError::Failed(_) => &self.handler_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            authentication_failures: self.authentication_failures.load(Ordering::Relaxed),
            wrong_endpoint: self.wrong_endpoint.load(Ordering::Relaxed),
            not_implemented: self.not_implemented.load(Ordering::Relaxed),
            invalid_payload: self.invalid_payload.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}
