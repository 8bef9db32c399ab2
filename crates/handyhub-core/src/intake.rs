//! Intake form rules applied before a request reaches the store.
//!
//! The store accepts anything; this module is the only place minimum lengths,
//! the photo cap and the scheduled-booking requirement are checked.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CUSTOM_TASK};
use crate::distance::DistanceEstimate;
use crate::requests::{BookingType, NewServiceRequest, ServiceAddress, ServiceTier};

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PHONE_LEN: usize = 10;
pub const MIN_ADDRESS_LEN: usize = 5;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_PHOTOS: usize = 3;
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_PHOTO_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeErrors(pub Vec<FieldError>);

impl fmt::Display for IntakeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for IntakeErrors {}

/// Raw submission from the public intake form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeForm {
    pub client_name: String,
    pub phone_number: String,
    pub service_address: String,
    #[serde(default)]
    pub service_lat: f64,
    #[serde(default)]
    pub service_lng: f64,
    /// Catalog service id; `None` means a custom task.
    #[serde(default)]
    pub service_id: Option<String>,
    pub description: String,
    /// URLs returned by the upload endpoint.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub service_tier: ServiceTier,
    #[serde(default)]
    pub booking_type: BookingType,
    #[serde(default)]
    pub scheduled_date_time: Option<DateTime<Utc>>,
}

/// A form that passed validation, ready to become a [`NewServiceRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedIntake {
    request: NewServiceRequest,
}

impl ValidatedIntake {
    #[must_use]
    pub fn address(&self) -> &ServiceAddress {
        &self.request.service_address
    }

    /// Attaches the travel estimate, if any, and yields the store input.
    #[must_use]
    pub fn into_new_request(self, estimate: Option<&DistanceEstimate>) -> NewServiceRequest {
        let mut request = self.request;
        request.estimated_distance = estimate.map(|e| e.distance);
        request.estimated_travel_time = estimate.map(|e| e.duration);
        request
    }
}

impl IntakeForm {
    /// Checks every rule and collects all failures rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeErrors`] listing each invalid field.
    pub fn validate(self, catalog: &Catalog) -> Result<ValidatedIntake, IntakeErrors> {
        let mut errors = Vec::new();

        let client_name = self.client_name.trim().to_string();
        let phone_number = self.phone_number.trim().to_string();
        let address = self.service_address.trim().to_string();
        let description = self.description.trim().to_string();

        if client_name.chars().count() < MIN_NAME_LEN {
            errors.push(FieldError::new(
                "clientName",
                "Name must be at least 2 characters",
            ));
        }
        if phone_number.chars().count() < MIN_PHONE_LEN {
            errors.push(FieldError::new(
                "phoneNumber",
                "Please enter a valid phone number",
            ));
        }
        if address.chars().count() < MIN_ADDRESS_LEN {
            errors.push(FieldError::new(
                "serviceAddress",
                "Please enter a valid address",
            ));
        }
        if description.chars().count() < MIN_DESCRIPTION_LEN {
            errors.push(FieldError::new(
                "description",
                "Please provide more details about your request",
            ));
        }

        let service_type = match self.service_id.as_deref() {
            None | Some("custom") => CUSTOM_TASK.to_string(),
            Some(id) => match catalog.find_service(id) {
                Some(service) => service.name.clone(),
                None => {
                    errors.push(FieldError::new(
                        "serviceId",
                        format!("Unknown service '{id}'"),
                    ));
                    String::new()
                }
            },
        };

        if self.photos.len() > MAX_PHOTOS {
            errors.push(FieldError::new(
                "photos",
                format!("At most {MAX_PHOTOS} photos may be attached"),
            ));
        }

        let scheduled_date_time = match self.booking_type {
            BookingType::Scheduled => {
                if self.scheduled_date_time.is_none() {
                    errors.push(FieldError::new(
                        "scheduledDateTime",
                        "Please choose a date and time for a scheduled booking",
                    ));
                }
                self.scheduled_date_time
            }
            BookingType::Asap => None,
        };

        if !errors.is_empty() {
            return Err(IntakeErrors(errors));
        }

        Ok(ValidatedIntake {
            request: NewServiceRequest {
                client_name,
                phone_number,
                service_address: ServiceAddress {
                    address,
                    lat: self.service_lat,
                    lng: self.service_lng,
                },
                service_type,
                description,
                photos: self.photos,
                service_tier: self.service_tier,
                booking_type: self.booking_type,
                scheduled_date_time,
                estimated_distance: None,
                estimated_travel_time: None,
            },
        })
    }
}

/// Checks an uploaded photo's size and declared MIME type.
///
/// # Errors
///
/// Returns a [`FieldError`] for empty, oversized or non-image uploads.
pub fn validate_photo_upload(size: usize, content_type: Option<&str>) -> Result<(), FieldError> {
    if size == 0 {
        return Err(FieldError::new("file", "No file body provided"));
    }
    if size > MAX_PHOTO_BYTES {
        return Err(FieldError::new("file", "Images must be under 5MB"));
    }
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match mime {
        Some(ref m) if ALLOWED_PHOTO_TYPES.contains(&m.as_str()) => Ok(()),
        _ => Err(FieldError::new(
            "file",
            "Only JPEG, PNG and WebP images are accepted",
        )),
    }
}
