//! DTOs for API responses that are not plain domain types.

use serde::Serialize;

use munreg_core::types::RegistrationStats;

/// Confirmation body, e.g. after a delete.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable confirmation
    pub message: String,
}

impl MessageResponse {
    /// Creates a message body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Number of registrations
    pub total: u64,
    /// Confirmed registrations
    pub confirmed: u64,
    /// Pending registrations
    pub pending: u64,
    /// Distinct committee codes in use
    pub committees: u64,
}

impl From<RegistrationStats> for StatsResponse {
    fn from(stats: RegistrationStats) -> Self {
        Self {
            total: stats.total,
            confirmed: stats.confirmed,
            pending: stats.pending,
            committees: stats.committees,
        }
    }
}

/// Committee offered on the registration form.
#[derive(Debug, Serialize)]
pub struct CommitteeDto {
    /// Code stored in registrations
    pub code: String,
    /// Display label
    pub label: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the state was built
    pub uptime_seconds: u64,
    /// Stored registrations
    pub registrations: u64,
}
