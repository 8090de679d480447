use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use tracing::info;
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;
use shared::{
    BookingData, BookingState, BookingStatus, CommissionBreakdown, CreateBookingData,
    CreateInquiryData, DomainError, InquiryData, PaymentStatus, PropertyTypeRegistry,
};

type DbPool = Pool<AsyncPgConnection>;

pub struct BookingCommands {
    pool: DbPool,
    registry: PropertyTypeRegistry,
}

impl BookingCommands {
    pub fn new(pool: DbPool, registry: PropertyTypeRegistry) -> Self {
        Self { pool, registry }
    }

    pub async fn create_booking(
        &self,
        request: CreateBookingData,
    ) -> Result<BookingData, DomainError> {
        validate_booking_request(&request, Utc::now().date_naive())?;

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let listing = listings::table
            .filter(listings::id.eq(request.listing_id))
            .first::<Listing>(&mut conn)
            .await
            .optional()?
            .ok_or(DomainError::ListingNotFound(request.listing_id))?;

        if !listing.active {
            return Err(DomainError::Validation(
                "listing is not accepting bookings".to_string(),
            ));
        }

        let property_type = self.registry.resolve(&listing.property_type);
        if !self.registry.is_bookable(property_type) {
            return Err(DomainError::InvalidPropertyType(property_type));
        }

        let conflicts = count_overlapping(
            &mut conn,
            request.listing_id,
            request.room_id,
            request.check_in,
            request.check_out,
        )
        .await?;
        if conflicts > 0 {
            return Err(DomainError::Validation(
                "listing is not available for the requested dates".to_string(),
            ));
        }

        // Commission is fixed here, at creation time; edits never recompute it.
        let breakdown = self
            .registry
            .compute_commission(request.total_price, property_type)?;

        let new_booking = NewBooking {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            room_id: request.room_id,
            guest_id: request.guest_id,
            host_id: listing.host_id,
            property_type: property_type.as_str().to_string(),
            check_in: request.check_in,
            check_out: request.check_out,
            num_guests: request.num_guests,
            total_price: money_from_f64(request.total_price, "total_price")?,
            commission_amount: money_from_f64(breakdown.commission_amount, "commission_amount")?,
            status: BookingStatus::Pending.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
        };

        diesel::insert_into(bookings::table)
            .values(&new_booking)
            .execute(&mut conn)
            .await?;

        info!(
            "Created booking {} for listing {} ({})",
            new_booking.id, listing.id, property_type
        );

        let booking = find_booking(&mut conn, new_booking.id).await?;
        booking.to_data(&self.registry)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<BookingData, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;
        let booking = find_booking(&mut conn, booking_id).await?;
        booking.to_data(&self.registry)
    }

    pub async fn confirm_booking(&self, booking_id: Uuid) -> Result<BookingData, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;
        let booking = find_booking(&mut conn, booking_id).await?;
        let next = booking.state()?.host_confirm()?;
        write_state(&mut conn, booking_id, next, None).await?;
        info!("Booking {} confirmed by host", booking_id);
        find_booking(&mut conn, booking_id)
            .await?
            .to_data(&self.registry)
    }

    pub async fn reject_booking(
        &self,
        booking_id: Uuid,
        reason: String,
    ) -> Result<BookingData, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;
        let booking = find_booking(&mut conn, booking_id).await?;
        let next = booking.state()?.host_reject()?;
        write_state(&mut conn, booking_id, next, Some(reason)).await?;
        info!("Booking {} rejected by host", booking_id);
        find_booking(&mut conn, booking_id)
            .await?
            .to_data(&self.registry)
    }

    pub async fn complete_booking(&self, booking_id: Uuid) -> Result<BookingData, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;
        let booking = find_booking(&mut conn, booking_id).await?;
        let next = booking.state()?.host_complete()?;
        write_state(&mut conn, booking_id, next, None).await?;
        info!("Booking {} completed", booking_id);
        find_booking(&mut conn, booking_id)
            .await?
            .to_data(&self.registry)
    }

    pub async fn cancel_booking(&self, booking_id: Uuid) -> Result<BookingData, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;
        let booking = find_booking(&mut conn, booking_id).await?;
        let next = booking.state()?.guest_cancel()?;
        write_state(&mut conn, booking_id, next, None).await?;
        info!("Booking {} cancelled by guest", booking_id);
        find_booking(&mut conn, booking_id)
            .await?
            .to_data(&self.registry)
    }

    pub async fn create_inquiry(
        &self,
        request: CreateInquiryData,
    ) -> Result<InquiryData, DomainError> {
        if request.message.trim().is_empty() {
            return Err(DomainError::Validation(
                "inquiry message must not be empty".to_string(),
            ));
        }

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let listing = listings::table
            .filter(listings::id.eq(request.listing_id))
            .first::<Listing>(&mut conn)
            .await
            .optional()?
            .ok_or(DomainError::ListingNotFound(request.listing_id))?;

        let property_type = self.registry.resolve(&listing.property_type);
        if !self.registry.is_inquiry_only(property_type) {
            return Err(DomainError::Validation(
                "listing takes direct bookings, not inquiries".to_string(),
            ));
        }

        let new_inquiry = NewInquiry {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            guest_id: request.guest_id,
            message: request.message,
        };

        diesel::insert_into(inquiries::table)
            .values(&new_inquiry)
            .execute(&mut conn)
            .await?;

        info!(
            "Created inquiry {} for listing {}",
            new_inquiry.id, listing.id
        );

        Ok(InquiryData {
            inquiry_id: new_inquiry.id,
            listing_id: new_inquiry.listing_id,
            guest_id: new_inquiry.guest_id,
            message: new_inquiry.message,
        })
    }

    /// Inquiries received for a listing, newest first. This is the host's
    /// side of the inquiry flow.
    pub async fn list_inquiries(&self, listing_id: Uuid) -> Result<Vec<Inquiry>, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        listings::table
            .filter(listings::id.eq(listing_id))
            .first::<Listing>(&mut conn)
            .await
            .optional()?
            .ok_or(DomainError::ListingNotFound(listing_id))?;

        let inquiries = inquiries::table
            .filter(inquiries::listing_id.eq(listing_id))
            .order(inquiries::created_at.desc())
            .load::<Inquiry>(&mut conn)
            .await?;
        Ok(inquiries)
    }

    /// Commission preview for a price and property type. Full precision;
    /// the API layer rounds for display.
    pub fn quote(&self, raw_type: &str, amount: f64) -> Result<CommissionBreakdown, DomainError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::Validation(
                "amount must be a non-negative number".to_string(),
            ));
        }
        let property_type = self.registry.resolve(raw_type);
        self.registry.compute_commission(amount, property_type)
    }
}

async fn find_booking(
    conn: &mut AsyncPgConnection,
    booking_id: Uuid,
) -> Result<Booking, DomainError> {
    bookings::table
        .filter(bookings::id.eq(booking_id))
        .first::<Booking>(conn)
        .await
        .optional()?
        .ok_or(DomainError::BookingNotFound(booking_id))
}

async fn write_state(
    conn: &mut AsyncPgConnection,
    booking_id: Uuid,
    next: BookingState,
    cancel_reason: Option<String>,
) -> Result<(), DomainError> {
    diesel::update(bookings::table.filter(bookings::id.eq(booking_id)))
        .set((
            bookings::status.eq(next.status.as_str()),
            bookings::payment_status.eq(next.payment_status.as_str()),
            bookings::cancel_reason.eq(cancel_reason),
            bookings::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// Overlap check against bookings that still hold the dates. Cancelled and
/// completed rows never block. Ranges are half-open: back-to-back stays
/// sharing a turnover day do not conflict.
async fn count_overlapping(
    conn: &mut AsyncPgConnection,
    listing_id: Uuid,
    room_id: Option<Uuid>,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<i64, DomainError> {
    let count = match room_id {
        Some(room_id) => {
            bookings::table
                .filter(bookings::listing_id.eq(listing_id))
                .filter(bookings::room_id.eq(room_id))
                .filter(bookings::status.eq_any([
                    BookingStatus::Pending.as_str(),
                    BookingStatus::Confirmed.as_str(),
                ]))
                .filter(bookings::check_in.lt(check_out))
                .filter(bookings::check_out.gt(check_in))
                .count()
                .get_result::<i64>(conn)
                .await?
        }
        None => {
            bookings::table
                .filter(bookings::listing_id.eq(listing_id))
                .filter(bookings::room_id.is_null())
                .filter(bookings::status.eq_any([
                    BookingStatus::Pending.as_str(),
                    BookingStatus::Confirmed.as_str(),
                ]))
                .filter(bookings::check_in.lt(check_out))
                .filter(bookings::check_out.gt(check_in))
                .count()
                .get_result::<i64>(conn)
                .await?
        }
    };
    Ok(count)
}

pub fn validate_booking_request(
    request: &CreateBookingData,
    today: NaiveDate,
) -> Result<(), DomainError> {
    if request.check_out <= request.check_in {
        return Err(DomainError::Validation(
            "check-out must be after check-in".to_string(),
        ));
    }
    if request.check_in < today {
        return Err(DomainError::Validation(
            "check-in must not be in the past".to_string(),
        ));
    }
    if request.num_guests < 1 {
        return Err(DomainError::Validation(
            "a booking needs at least one guest".to_string(),
        ));
    }
    if !request.total_price.is_finite() || request.total_price < 0.0 {
        return Err(DomainError::Validation(
            "total price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(check_in: NaiveDate, check_out: NaiveDate) -> CreateBookingData {
        CreateBookingData {
            listing_id: Uuid::new_v4(),
            room_id: None,
            guest_id: Uuid::new_v4(),
            check_in,
            check_out,
            num_guests: 2,
            total_price: 450.0,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_a_future_stay() {
        let today = date(2026, 8, 1);
        let req = request(date(2026, 8, 10), date(2026, 8, 14));
        assert!(validate_booking_request(&req, today).is_ok());
    }

    #[test]
    fn rejects_inverted_or_zero_length_stays() {
        let today = date(2026, 8, 1);
        let req = request(date(2026, 8, 14), date(2026, 8, 10));
        assert!(validate_booking_request(&req, today).is_err());
        let req = request(date(2026, 8, 10), date(2026, 8, 10));
        assert!(validate_booking_request(&req, today).is_err());
    }

    #[test]
    fn rejects_past_check_in() {
        let today = date(2026, 8, 1);
        let req = request(date(2026, 7, 20), date(2026, 8, 10));
        assert!(validate_booking_request(&req, today).is_err());
    }

    #[test]
    fn same_day_check_in_is_allowed() {
        let today = date(2026, 8, 1);
        let req = request(date(2026, 8, 1), date(2026, 8, 3));
        assert!(validate_booking_request(&req, today).is_ok());
    }

    #[test]
    fn rejects_empty_party_and_bad_price() {
        let today = date(2026, 8, 1);
        let mut req = request(date(2026, 8, 10), date(2026, 8, 14));
        req.num_guests = 0;
        assert!(validate_booking_request(&req, today).is_err());

        let mut req = request(date(2026, 8, 10), date(2026, 8, 14));
        req.total_price = -1.0;
        assert!(validate_booking_request(&req, today).is_err());

        let mut req = request(date(2026, 8, 10), date(2026, 8, 14));
        req.total_price = f64::NAN;
        assert!(validate_booking_request(&req, today).is_err());
    }
}
