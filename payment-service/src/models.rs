use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use shared::{BookingState, BookingStatus, DomainError, PaymentStatus};
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::payments)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: BigDecimal,
    pub payment_method: String,
    pub reference: Option<String>,
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable, Serialize)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: BigDecimal,
    pub payment_method: String,
    pub reference: Option<String>,
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = crate::schema::wallet_entries)]
pub struct WalletEntry {
    pub id: Uuid,
    pub host_id: Uuid,
    pub booking_id: Uuid,
    pub amount: BigDecimal,
    pub entry_type: String,
    pub reference: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::wallet_entries)]
pub struct NewWalletEntry {
    pub id: Uuid,
    pub host_id: Uuid,
    pub booking_id: Uuid,
    pub amount: BigDecimal,
    pub entry_type: String,
    pub reference: Option<String>,
}

impl Booking {
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

    /// Host payout for this booking: the split fixed at creation time, so
    /// the ledger always matches the stored commission exactly.
    pub fn host_earnings(&self) -> BigDecimal {
        &self.total_price - &self.commission_amount
    }
}

pub fn money_to_f64(value: &BigDecimal, field: &str) -> Result<f64, DomainError> {
    value
        .to_f64()
        .ok_or_else(|| DomainError::Validation(format!("non-numeric {} on stored row", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn booking_row(total: &str, commission: &str) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            room_id: None,
            guest_id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            property_type: "hotel".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            num_guests: 2,
            total_price: BigDecimal::from_str(total).unwrap(),
            commission_amount: BigDecimal::from_str(commission).unwrap(),
            status: "confirmed".to_string(),
            payment_status: "pending".to_string(),
            cancel_reason: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn host_earnings_is_stored_split() {
        let booking = booking_row("1000", "150");
        assert_eq!(booking.host_earnings(), BigDecimal::from(850));

        let booking = booking_row("500", "60");
        assert_eq!(booking.host_earnings(), BigDecimal::from(440));
    }

    #[test]
    fn host_earnings_keeps_decimal_precision() {
        let booking = booking_row("333.33", "49.9995");
        assert_eq!(
            booking.host_earnings(),
            BigDecimal::from_str("283.3305").unwrap()
        );
    }
}
