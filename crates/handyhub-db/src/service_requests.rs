//! Database operations for `service_requests`.

use chrono::{DateTime, Utc};
use handyhub_core::{NewServiceRequest, RequestStatus, ServiceAddress, ServiceRequest};
use sqlx::PgPool;

use crate::DbError;

const COLUMNS: &str = "id, client_name, phone_number, address, lat, lng, service_type, \
                       description, photos, service_tier, booking_type, scheduled_date_time, \
                       status, estimated_distance, estimated_travel_time, created_at, updated_at";

/// A row from the `service_requests` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRequestRow {
    pub id: i64,
    pub client_name: String,
    pub phone_number: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub service_type: String,
    pub description: String,
    pub photos: Vec<String>,
    pub service_tier: String,
    pub booking_type: String,
    pub scheduled_date_time: Option<DateTime<Utc>>,
    pub status: String,
    pub estimated_distance: Option<f64>,
    pub estimated_travel_time: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceRequestRow> for ServiceRequest {
    type Error = DbError;

    fn try_from(row: ServiceRequestRow) -> Result<Self, Self::Error> {
        Ok(ServiceRequest {
            id: row.id.to_string(),
            client_name: row.client_name,
            phone_number: row.phone_number,
            service_address: ServiceAddress {
                address: row.address,
                lat: row.lat,
                lng: row.lng,
            },
            service_type: row.service_type,
            description: row.description,
            photos: row.photos,
            service_tier: row.service_tier.parse()?,
            booking_type: row.booking_type.parse()?,
            scheduled_date_time: row.scheduled_date_time,
            status: row.status.parse()?,
            estimated_distance: row.estimated_distance,
            estimated_travel_time: row.estimated_travel_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts a new request in `pending` status with both timestamps set to `now`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_service_request(
    pool: &PgPool,
    new: &NewServiceRequest,
    now: DateTime<Utc>,
) -> Result<ServiceRequestRow, DbError> {
    let row = sqlx::query_as::<_, ServiceRequestRow>(&format!(
        "INSERT INTO service_requests \
           (client_name, phone_number, address, lat, lng, service_type, description, photos, \
            service_tier, booking_type, scheduled_date_time, status, estimated_distance, \
            estimated_travel_time, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending', $12, $13, $14, $14) \
         RETURNING {COLUMNS}"
    ))
    .bind(&new.client_name)
    .bind(&new.phone_number)
    .bind(&new.service_address.address)
    .bind(new.service_address.lat)
    .bind(new.service_address.lng)
    .bind(&new.service_type)
    .bind(&new.description)
    .bind(&new.photos)
    .bind(new.service_tier.as_str())
    .bind(new.booking_type.as_str())
    .bind(new.scheduled_date_time)
    .bind(new.estimated_distance)
    .bind(new.estimated_travel_time)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single request by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_service_request(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ServiceRequestRow>, DbError> {
    let row = sqlx::query_as::<_, ServiceRequestRow>(&format!(
        "SELECT {COLUMNS} FROM service_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Writes every mutable column of `request` back to its row, provided the row
/// is still in `expected_status`.
///
/// `created_at` is never written. Returns `false` when the row no longer exists
/// or its status has moved on since it was read.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_service_request(
    pool: &PgPool,
    id: i64,
    request: &ServiceRequest,
    expected_status: RequestStatus,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE service_requests SET \
             client_name = $1, phone_number = $2, address = $3, lat = $4, lng = $5, \
             service_type = $6, description = $7, photos = $8, service_tier = $9, \
             booking_type = $10, scheduled_date_time = $11, status = $12, \
             estimated_distance = $13, estimated_travel_time = $14, updated_at = $15 \
         WHERE id = $16 AND status = $17",
    )
    .bind(&request.client_name)
    .bind(&request.phone_number)
    .bind(&request.service_address.address)
    .bind(request.service_address.lat)
    .bind(request.service_address.lng)
    .bind(&request.service_type)
    .bind(&request.description)
    .bind(&request.photos)
    .bind(request.service_tier.as_str())
    .bind(request.booking_type.as_str())
    .bind(request.scheduled_date_time)
    .bind(request.status.as_str())
    .bind(request.estimated_distance)
    .bind(request.estimated_travel_time)
    .bind(request.updated_at)
    .bind(id)
    .bind(expected_status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns every request, or only those in `status`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_service_requests(
    pool: &PgPool,
    status: Option<&str>,
) -> Result<Vec<ServiceRequestRow>, DbError> {
    let rows = sqlx::query_as::<_, ServiceRequestRow>(&format!(
        "SELECT {COLUMNS} FROM service_requests \
         WHERE ($1::TEXT IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
