use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::info;
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;
use shared::{DomainError, PaymentOutcome, PaymentReceipt, PaymentStatus};

type DbPool = Pool<AsyncPgConnection>;

pub struct PaymentProcessor {
    pool: DbPool,
}

impl PaymentProcessor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Finalize a booking as paid. The caller is the payment rail (card
    /// processor callback or manual mobile-money acknowledgment); by the
    /// time this runs the money has moved, so the only jobs left are the
    /// status flip and the host payout, which must commit together.
    pub async fn confirm_payment(
        &self,
        booking_id: Uuid,
        method: String,
        reference: Option<String>,
    ) -> Result<PaymentReceipt, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let booking = bookings::table
            .filter(bookings::id.eq(booking_id))
            .first::<Booking>(&mut conn)
            .await
            .optional()?
            .ok_or(DomainError::BookingNotFound(booking_id))?;

        let state = booking.state()?;
        let host_earnings = money_to_f64(&booking.host_earnings(), "host_earnings")?;

        let next = match state.confirm_payment()? {
            PaymentOutcome::AlreadyConfirmed => {
                info!("Payment for booking {} already confirmed, skipping", booking_id);
                return Ok(PaymentReceipt {
                    booking_id,
                    host_earnings,
                    already_confirmed: true,
                });
            }
            PaymentOutcome::Applied(next) => next,
        };

        let host_id = booking.host_id;
        let amount = booking.total_price.clone();
        let payout = booking.host_earnings();

        let receipt = conn
            .transaction::<_, DomainError, _>(|conn| {
                Box::pin(async move {
                    // Conditional flip enforces at-most-once even against a
                    // concurrent confirmation; zero rows means we lost the
                    // race and must not credit again.
                    let flipped = diesel::update(
                        bookings::table
                            .filter(bookings::id.eq(booking_id))
                            .filter(
                                bookings::payment_status.eq(PaymentStatus::Pending.as_str()),
                            ),
                    )
                    .set((
                        bookings::payment_status.eq(next.payment_status.as_str()),
                        bookings::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
                    .await?;

                    if flipped == 0 {
                        return Ok(PaymentReceipt {
                            booking_id,
                            host_earnings,
                            already_confirmed: true,
                        });
                    }

                    let payment = NewPayment {
                        id: Uuid::new_v4(),
                        booking_id,
                        amount,
                        payment_method: method,
                        reference: reference.clone(),
                        status: "processed".to_string(),
                        processed_at: Some(Utc::now()),
                    };
                    diesel::insert_into(payments::table)
                        .values(&payment)
                        .execute(conn)
                        .await?;

                    let entry = NewWalletEntry {
                        id: Uuid::new_v4(),
                        host_id,
                        booking_id,
                        amount: payout,
                        entry_type: "booking_payout".to_string(),
                        reference,
                    };
                    diesel::insert_into(wallet_entries::table)
                        .values(&entry)
                        .execute(conn)
                        .await?;

                    Ok(PaymentReceipt {
                        booking_id,
                        host_earnings,
                        already_confirmed: false,
                    })
                })
            })
            .await?;

        if receipt.already_confirmed {
            info!("Payment for booking {} raced an earlier confirmation", booking_id);
        } else {
            info!(
                "Booking {} marked paid, credited {} to host {}",
                booking_id, receipt.host_earnings, host_id
            );
        }

        Ok(receipt)
    }

    /// The payment record written by a successful confirmation, if any.
    pub async fn get_payment(&self, booking_id: Uuid) -> Result<Option<Payment>, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let payment = payments::table
            .filter(payments::booking_id.eq(booking_id))
            .first::<Payment>(&mut conn)
            .await
            .optional()?;
        Ok(payment)
    }

    pub async fn wallet_entries_for(&self, host_id: Uuid) -> Result<Vec<WalletEntry>, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let entries = wallet_entries::table
            .filter(wallet_entries::host_id.eq(host_id))
            .order(wallet_entries::created_at.desc())
            .load::<WalletEntry>(&mut conn)
            .await?;
        Ok(entries)
    }

    pub async fn wallet_balance(&self, host_id: Uuid) -> Result<f64, DomainError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let total: Option<BigDecimal> = wallet_entries::table
            .filter(wallet_entries::host_id.eq(host_id))
            .select(diesel::dsl::sum(wallet_entries::amount))
            .first(&mut conn)
            .await?;

        match total {
            Some(total) => money_to_f64(&total, "wallet balance"),
            None => Ok(0.0),
        }
    }
}
