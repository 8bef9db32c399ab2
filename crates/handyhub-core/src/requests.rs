//! The `ServiceRequest` entity, its enums, and the status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid service tier: {0}")]
    InvalidTier(String),

    #[error("invalid booking type: {0}")]
    InvalidBookingType(String),

    #[error("cannot move a request from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle stage of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable from `self` in one step.
    ///
    /// Work moves forward `pending -> accepted -> in_progress -> completed`;
    /// any non-terminal status may also be cancelled.
    #[must_use]
    pub fn next_statuses(self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::Pending => &[RequestStatus::Accepted, RequestStatus::Cancelled],
            RequestStatus::Accepted => &[RequestStatus::InProgress, RequestStatus::Cancelled],
            RequestStatus::InProgress => &[RequestStatus::Completed, RequestStatus::Cancelled],
            RequestStatus::Completed | RequestStatus::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTier {
    #[default]
    Standard,
    Emergency,
}

impl ServiceTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceTier::Standard => "standard",
            ServiceTier::Emergency => "emergency",
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ServiceTier::Standard),
            "emergency" => Ok(ServiceTier::Emergency),
            other => Err(CoreError::InvalidTier(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    #[default]
    Asap,
    Scheduled,
}

impl BookingType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookingType::Asap => "asap",
            BookingType::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asap" => Ok(BookingType::Asap),
            "scheduled" => Ok(BookingType::Scheduled),
            other => Err(CoreError::InvalidBookingType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Free-text address with optional coordinates.
///
/// `(0.0, 0.0)` marks an address that was typed by hand and never geocoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAddress {
    pub address: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

impl ServiceAddress {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !(self.lat == 0.0 && self.lng == 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub client_name: String,
    pub phone_number: String,
    pub service_address: ServiceAddress,
    pub service_type: String,
    pub description: String,
    pub photos: Vec<String>,
    pub service_tier: ServiceTier,
    pub booking_type: BookingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date_time: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    /// Miles from the base location, when the distance lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_distance: Option<f64>,
    /// Minutes of travel from the base location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_travel_time: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a caller supplies when creating a request.
///
/// The store assigns `id`, `status`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRequest {
    pub client_name: String,
    pub phone_number: String,
    pub service_address: ServiceAddress,
    pub service_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub service_tier: ServiceTier,
    #[serde(default)]
    pub booking_type: BookingType,
    #[serde(default)]
    pub scheduled_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_distance: Option<f64>,
    #[serde(default)]
    pub estimated_travel_time: Option<f64>,
}

/// Sparse update. Absent fields keep their current value.
///
/// Nullable fields use `Option<Option<T>>`: outer `None` = "not in request",
/// `Some(None)` = "explicitly cleared", `Some(Some(v))` = "set to value".
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestPatch {
    pub client_name: Option<String>,
    pub phone_number: Option<String>,
    pub service_address: Option<ServiceAddress>,
    pub service_type: Option<String>,
    pub description: Option<String>,
    pub photos: Option<Vec<String>>,
    pub service_tier: Option<ServiceTier>,
    pub booking_type: Option<BookingType>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_date_time: Option<Option<DateTime<Utc>>>,
    pub status: Option<RequestStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_distance: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_travel_time: Option<Option<f64>>,
}

impl ServiceRequestPatch {
    #[must_use]
    pub fn status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[allow(clippy::option_option)]
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Current time at the microsecond precision every backend can store.
#[must_use]
pub fn stamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Next `updated_at` value: `now`, or one microsecond past `previous` when the
/// clock has not advanced.
#[must_use]
pub fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl ServiceRequest {
    /// Builds the stored form of a new request. Status always starts at `pending`.
    #[must_use]
    pub fn from_new(id: String, new: NewServiceRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            client_name: new.client_name,
            phone_number: new.phone_number,
            service_address: new.service_address,
            service_type: new.service_type,
            description: new.description,
            photos: new.photos,
            service_tier: new.service_tier,
            booking_type: new.booking_type,
            scheduled_date_time: new.scheduled_date_time,
            status: RequestStatus::Pending,
            estimated_distance: new.estimated_distance,
            estimated_travel_time: new.estimated_travel_time,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `patch` into the record and refreshes `updated_at`.
    ///
    /// The status change is checked before anything is written, so a rejected
    /// transition leaves the record untouched. Re-sending the current status is
    /// accepted as a no-op for that field.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when the patch asks for a status
    /// not reachable from the current one.
    pub fn apply_patch(
        &mut self,
        patch: ServiceRequestPatch,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if let Some(next) = patch.status {
            if next != self.status && !self.status.can_transition_to(next) {
                return Err(CoreError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
        }

        if let Some(v) = patch.client_name {
            self.client_name = v;
        }
        if let Some(v) = patch.phone_number {
            self.phone_number = v;
        }
        if let Some(v) = patch.service_address {
            self.service_address = v;
        }
        if let Some(v) = patch.service_type {
            self.service_type = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.photos {
            self.photos = v;
        }
        if let Some(v) = patch.service_tier {
            self.service_tier = v;
        }
        if let Some(v) = patch.booking_type {
            self.booking_type = v;
        }
        if let Some(v) = patch.scheduled_date_time {
            self.scheduled_date_time = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.estimated_distance {
            self.estimated_distance = v;
        }
        if let Some(v) = patch.estimated_travel_time {
            self.estimated_travel_time = v;
        }

        self.updated_at = next_timestamp(self.updated_at, now);
        Ok(())
    }

    /// Case-insensitive substring match over client name, service type and
    /// address. An empty term matches everything.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.client_name.to_lowercase().contains(&term)
            || self.service_type.to_lowercase().contains(&term)
            || self.service_address.address.to_lowercase().contains(&term)
    }
}
