use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use shared::{BookingData, BookingState, BookingStatus, DomainError, PaymentStatus, PropertyTypeRegistry};
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = crate::schema::listings)]
pub struct Listing {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub property_type: String,
    pub nightly_price: BigDecimal,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::bookings)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub property_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub total_price: BigDecimal,
    pub commission_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub cancel_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub property_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub total_price: BigDecimal,
    pub commission_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = crate::schema::inquiries)]
pub struct Inquiry {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::inquiries)]
pub struct NewInquiry {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub message: String,
}

pub fn money_to_f64(value: &BigDecimal, field: &str) -> Result<f64, DomainError> {
    value
        .to_f64()
        .ok_or_else(|| DomainError::Validation(format!("non-numeric {} on stored row", field)))
}

pub fn money_from_f64(value: f64, field: &str) -> Result<BigDecimal, DomainError> {
    BigDecimal::from_f64(value)
        .ok_or_else(|| DomainError::Validation(format!("non-numeric {}", field)))
}

impl Booking {
    /// Parse the stored status pair into the typed state machine. Statuses
    /// are written only by this core, so an unknown string is a corrupt row
    /// and surfaces as an error rather than a silent default.
    pub fn state(&self) -> Result<BookingState, DomainError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            DomainError::Validation(format!("unknown booking status {:?}", self.status))
        })?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            DomainError::Validation(format!("unknown payment status {:?}", self.payment_status))
        })?;
        Ok(BookingState {
            status,
            payment_status,
        })
    }

    pub fn to_data(&self, registry: &PropertyTypeRegistry) -> Result<BookingData, DomainError> {
        let state = self.state()?;
        Ok(BookingData {
            booking_id: self.id,
            listing_id: self.listing_id,
            room_id: self.room_id,
            guest_id: self.guest_id,
            host_id: self.host_id,
            property_type: registry.resolve(&self.property_type),
            check_in: self.check_in,
            check_out: self.check_out,
            num_guests: self.num_guests,
            total_price: money_to_f64(&self.total_price, "total_price")?,
            commission_amount: money_to_f64(&self.commission_amount, "commission_amount")?,
            status: state.status,
            payment_status: state.payment_status,
            cancel_reason: self.cancel_reason.clone(),
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PropertyType;

    fn booking_row(status: &str, payment_status: &str, property_type: &str) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            room_id: None,
            guest_id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            property_type: property_type.to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            num_guests: 2,
            total_price: BigDecimal::from(1000),
            commission_amount: BigDecimal::from(150),
            status: status.to_string(),
            payment_status: payment_status.to_string(),
            cancel_reason: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn state_parses_stored_status_pair() {
        let row = booking_row("confirmed", "pending", "hotel");
        let state = row.state().unwrap();
        assert_eq!(state.status, BookingStatus::Confirmed);
        assert_eq!(state.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn unknown_status_is_a_corrupt_row() {
        let row = booking_row("archived", "pending", "hotel");
        assert!(matches!(row.state(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn to_data_resolves_property_type_leniently() {
        let registry = PropertyTypeRegistry::new();
        let row = booking_row("pending", "pending", "chalet");
        let data = row.to_data(&registry).unwrap();
        // unknown type degrades to the non-bookable rental category
        assert_eq!(data.property_type, PropertyType::Rental);
        assert_eq!(data.total_price, 1000.0);
        assert_eq!(data.commission_amount, 150.0);
    }
}
