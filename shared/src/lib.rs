use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Hotel,
    FullyFurnished,
    Rental,
}

impl PropertyType {
    pub const ALL: [PropertyType; 3] = [
        PropertyType::Hotel,
        PropertyType::FullyFurnished,
        PropertyType::Rental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Hotel => "hotel",
            PropertyType::FullyFurnished => "fully_furnished",
            PropertyType::Rental => "rental",
        }
    }

    pub fn parse(raw: &str) -> Option<PropertyType> {
        match raw {
            "hotel" => Some(PropertyType::Hotel),
            "fully_furnished" => Some(PropertyType::FullyFurnished),
            "rental" => Some(PropertyType::Rental),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyTypeConfig {
    pub commission_rate: f64,
    pub booking_enabled: bool,
    pub payment_enabled: bool,
    pub inquiry_enabled: bool,
}

/// Immutable lookup table mapping a property category to its commission
/// rate and capability flags. Built once at startup and injected into the
/// services; never consulted as global state.
#[derive(Debug, Clone)]
pub struct PropertyTypeRegistry {
    configs: [PropertyTypeConfig; 3],
}

impl PropertyTypeRegistry {
    pub fn new() -> Self {
        Self {
            configs: [
                // hotel
                PropertyTypeConfig {
                    commission_rate: 15.0,
                    booking_enabled: true,
                    payment_enabled: true,
                    inquiry_enabled: false,
                },
                // fully_furnished
                PropertyTypeConfig {
                    commission_rate: 12.0,
                    booking_enabled: true,
                    payment_enabled: true,
                    inquiry_enabled: false,
                },
                // rental: inquiry-only, no commission
                PropertyTypeConfig {
                    commission_rate: 0.0,
                    booking_enabled: false,
                    payment_enabled: false,
                    inquiry_enabled: true,
                },
            ],
        }
    }

    pub fn config(&self, property_type: PropertyType) -> &PropertyTypeConfig {
        &self.configs[property_type as usize]
    }

    /// Resolve a raw property-type string coming out of the store. Unknown
    /// values fall back to the most restrictive category (rental: not
    /// bookable, no commission) so a bad row degrades to a rejected booking
    /// instead of a mispriced one.
    pub fn resolve(&self, raw: &str) -> PropertyType {
        match PropertyType::parse(raw) {
            Some(property_type) => property_type,
            None => {
                warn!("Unrecognized property type {:?}, falling back to rental defaults", raw);
                PropertyType::Rental
            }
        }
    }

    pub fn config_for(&self, raw: &str) -> &PropertyTypeConfig {
        self.config(self.resolve(raw))
    }

    pub fn is_bookable(&self, property_type: PropertyType) -> bool {
        self.config(property_type).booking_enabled
    }

    pub fn has_commission(&self, property_type: PropertyType) -> bool {
        self.config(property_type).commission_rate > 0.0
    }

    pub fn rate(&self, property_type: PropertyType) -> f64 {
        self.config(property_type).commission_rate
    }

    pub fn is_inquiry_only(&self, property_type: PropertyType) -> bool {
        self.config(property_type).inquiry_enabled
    }

    /// Split an amount into platform commission and host earnings for a
    /// bookable property type. The booking flow never reaches this for
    /// inquiry-only types; getting here with one is a caller bug.
    pub fn compute_commission(
        &self,
        amount: f64,
        property_type: PropertyType,
    ) -> Result<CommissionBreakdown, DomainError> {
        let config = self.config(property_type);
        if !config.booking_enabled {
            return Err(DomainError::InvalidPropertyType(property_type));
        }

        let commission_amount = if config.commission_rate > 0.0 {
            amount * config.commission_rate / 100.0
        } else {
            0.0
        };

        Ok(CommissionBreakdown {
            subtotal: amount,
            commission_rate: config.commission_rate,
            commission_amount,
            host_earnings: amount - commission_amount,
        })
    }
}

impl Default for PropertyTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived split of a booking's total price. Values keep full floating
/// precision; `rounded` is for display surfaces only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub subtotal: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub host_earnings: f64,
}

impl CommissionBreakdown {
    pub fn rounded(&self) -> CommissionBreakdown {
        CommissionBreakdown {
            subtotal: round_display(self.subtotal),
            commission_rate: self.commission_rate,
            commission_amount: round_display(self.commission_amount),
            host_earnings: round_display(self.host_earnings),
        }
    }
}

pub fn round_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<BookingStatus> {
        match raw {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(raw: &str) -> Option<PaymentStatus> {
        match raw {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two status axes of a booking, moved only through the transition
/// methods below. Every transition checks its precondition exhaustively,
/// so illegal combinations are rejected at the type's edge instead of
/// re-checked ad hoc at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingState {
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

/// Result of applying a payment confirmation: either the state actually
/// moved, or the booking was already paid and the call is an idempotent
/// no-op (not an error, so replays cannot double-credit the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Applied(BookingState),
    AlreadyConfirmed,
}

impl BookingState {
    pub fn new() -> Self {
        Self {
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
        }
    }

    fn invalid(self, action: &'static str) -> DomainError {
        DomainError::InvalidState {
            action,
            status: self.status,
            payment_status: self.payment_status,
        }
    }

    pub fn host_confirm(self) -> Result<BookingState, DomainError> {
        match self.status {
            BookingStatus::Pending => Ok(BookingState {
                status: BookingStatus::Confirmed,
                ..self
            }),
            _ => Err(self.invalid("confirm")),
        }
    }

    pub fn host_reject(self) -> Result<BookingState, DomainError> {
        match self.status {
            BookingStatus::Pending => Ok(BookingState {
                status: BookingStatus::Cancelled,
                ..self
            }),
            _ => Err(self.invalid("reject")),
        }
    }

    pub fn host_complete(self) -> Result<BookingState, DomainError> {
        match self.status {
            BookingStatus::Confirmed => Ok(BookingState {
                status: BookingStatus::Completed,
                ..self
            }),
            _ => Err(self.invalid("complete")),
        }
    }

    pub fn guest_cancel(self) -> Result<BookingState, DomainError> {
        match self.status {
            BookingStatus::Pending => Ok(BookingState {
                status: BookingStatus::Cancelled,
                ..self
            }),
            _ => Err(self.invalid("cancel")),
        }
    }

    /// The only path that sets `payment_status = paid`. Requires the host
    /// to have confirmed first; a booking that is already paid reports
    /// `AlreadyConfirmed` so the caller can skip the ledger credit.
    pub fn confirm_payment(self) -> Result<PaymentOutcome, DomainError> {
        match (self.status, self.payment_status) {
            (BookingStatus::Confirmed | BookingStatus::Completed, PaymentStatus::Paid) => {
                Ok(PaymentOutcome::AlreadyConfirmed)
            }
            (BookingStatus::Confirmed | BookingStatus::Completed, PaymentStatus::Pending) => {
                Ok(PaymentOutcome::Applied(BookingState {
                    payment_status: PaymentStatus::Paid,
                    ..self
                }))
            }
            _ => Err(self.invalid("confirm payment for")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self.status {
            BookingStatus::Cancelled => true,
            BookingStatus::Completed => self.payment_status == PaymentStatus::Paid,
            _ => false,
        }
    }
}

impl Default for BookingState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("property type {0} is not bookable")]
    InvalidPropertyType(PropertyType),
    #[error("cannot {action} a booking in state {status}/{payment_status}")]
    InvalidState {
        action: &'static str,
        status: BookingStatus,
        payment_status: PaymentStatus,
    },
    #[error("booking {0} not found")]
    BookingNotFound(Uuid),
    #[error("listing {0} not found")]
    ListingNotFound(Uuid),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[from] diesel::result::Error),
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingData {
    pub listing_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingData {
    pub booking_id: Uuid,
    pub listing_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub property_type: PropertyType,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub total_price: f64,
    pub commission_amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub cancel_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInquiryData {
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryData {
    pub inquiry_id: Uuid,
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub booking_id: Uuid,
    pub host_earnings: f64,
    pub already_confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PropertyTypeRegistry {
        PropertyTypeRegistry::new()
    }

    #[test]
    fn rate_table_is_exact() {
        let registry = registry();
        assert_eq!(registry.rate(PropertyType::Hotel), 15.0);
        assert_eq!(registry.rate(PropertyType::FullyFurnished), 12.0);
        assert_eq!(registry.rate(PropertyType::Rental), 0.0);
    }

    #[test]
    fn capability_flags_match_rate_table() {
        let registry = registry();
        assert!(registry.is_bookable(PropertyType::Hotel));
        assert!(registry.is_bookable(PropertyType::FullyFurnished));
        assert!(!registry.is_bookable(PropertyType::Rental));
        assert!(registry.is_inquiry_only(PropertyType::Rental));
        assert!(registry.has_commission(PropertyType::Hotel));
        assert!(registry.has_commission(PropertyType::FullyFurnished));
        assert!(!registry.has_commission(PropertyType::Rental));
    }

    #[test]
    fn exactly_one_of_booking_or_inquiry_per_type() {
        let registry = registry();
        for property_type in PropertyType::ALL {
            let config = registry.config(property_type);
            assert_ne!(
                config.booking_enabled, config.inquiry_enabled,
                "{} must be exactly one of bookable or inquiry-only",
                property_type
            );
        }
    }

    #[test]
    fn unknown_type_falls_back_to_rental_defaults() {
        let registry = registry();
        assert_eq!(registry.resolve("timeshare"), PropertyType::Rental);
        assert_eq!(
            registry.config_for("timeshare"),
            registry.config(PropertyType::Rental)
        );
        assert_eq!(registry.resolve("hotel"), PropertyType::Hotel);
    }

    #[test]
    fn breakdown_sums_to_subtotal_for_bookable_types() {
        let registry = registry();
        for property_type in [PropertyType::Hotel, PropertyType::FullyFurnished] {
            for amount in [0.0, 1.0, 250.0, 1000.0, 123456.78] {
                let breakdown = registry.compute_commission(amount, property_type).unwrap();
                assert_eq!(
                    breakdown.commission_amount + breakdown.host_earnings,
                    amount
                );
            }
            // prices that are not exactly representable stay within one ulp
            let breakdown = registry.compute_commission(99.99, property_type).unwrap();
            assert!((breakdown.commission_amount + breakdown.host_earnings - 99.99).abs() < 1e-9);
        }
    }

    #[test]
    fn hotel_scenario_1000() {
        let breakdown = registry()
            .compute_commission(1000.0, PropertyType::Hotel)
            .unwrap();
        assert_eq!(breakdown.commission_amount, 150.0);
        assert_eq!(breakdown.host_earnings, 850.0);
    }

    #[test]
    fn fully_furnished_scenario_500() {
        let breakdown = registry()
            .compute_commission(500.0, PropertyType::FullyFurnished)
            .unwrap();
        assert_eq!(breakdown.commission_amount, 60.0);
        assert_eq!(breakdown.host_earnings, 440.0);
    }

    #[test]
    fn rental_is_not_commissionable() {
        let err = registry()
            .compute_commission(300.0, PropertyType::Rental)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidPropertyType(PropertyType::Rental)
        ));
    }

    #[test]
    fn display_rounding_is_two_places() {
        let breakdown = registry()
            .compute_commission(333.335, PropertyType::Hotel)
            .unwrap()
            .rounded();
        assert_eq!(breakdown.commission_amount, 50.0);
        assert_eq!(breakdown.host_earnings, 283.33);
    }

    #[test]
    fn happy_path_confirm_pay_complete() {
        let state = BookingState::new();
        assert_eq!(state.status, BookingStatus::Pending);
        assert_eq!(state.payment_status, PaymentStatus::Pending);

        let confirmed = state.host_confirm().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.payment_status, PaymentStatus::Pending);

        let paid = match confirmed.confirm_payment().unwrap() {
            PaymentOutcome::Applied(next) => next,
            PaymentOutcome::AlreadyConfirmed => panic!("first payment must apply"),
        };
        // Payment flips the payment axis only; status stays confirmed.
        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);

        let completed = paid.host_complete().unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        assert!(completed.is_terminal());
    }

    #[test]
    fn second_payment_is_idempotent() {
        let paid = match BookingState::new()
            .host_confirm()
            .unwrap()
            .confirm_payment()
            .unwrap()
        {
            PaymentOutcome::Applied(next) => next,
            PaymentOutcome::AlreadyConfirmed => panic!("first payment must apply"),
        };
        assert_eq!(
            paid.confirm_payment().unwrap(),
            PaymentOutcome::AlreadyConfirmed
        );
    }

    #[test]
    fn payment_requires_host_confirmation_first() {
        let err = BookingState::new().confirm_payment().unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
    }

    #[test]
    fn rejected_booking_cannot_be_paid() {
        let cancelled = BookingState::new().host_reject().unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.is_terminal());
        let err = cancelled.confirm_payment().unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
    }

    #[test]
    fn guest_cancel_only_while_pending() {
        assert!(BookingState::new().guest_cancel().is_ok());
        let confirmed = BookingState::new().host_confirm().unwrap();
        assert!(confirmed.guest_cancel().is_err());
    }

    #[test]
    fn complete_requires_confirmed() {
        assert!(BookingState::new().host_complete().is_err());
        let cancelled = BookingState::new().host_reject().unwrap();
        assert!(cancelled.host_complete().is_err());
    }

    #[test]
    fn no_transition_sequence_pays_a_pending_booking() {
        // Walk every reachable state through every transition to depth 6 and
        // assert paid-while-pending never appears.
        fn successors(state: BookingState) -> Vec<BookingState> {
            let mut next = Vec::new();
            if let Ok(s) = state.host_confirm() {
                next.push(s);
            }
            if let Ok(s) = state.host_reject() {
                next.push(s);
            }
            if let Ok(s) = state.host_complete() {
                next.push(s);
            }
            if let Ok(s) = state.guest_cancel() {
                next.push(s);
            }
            if let Ok(PaymentOutcome::Applied(s)) = state.confirm_payment() {
                next.push(s);
            }
            next
        }

        let mut frontier = vec![BookingState::new()];
        for _ in 0..6 {
            let mut reached = Vec::new();
            for state in &frontier {
                for next in successors(*state) {
                    assert!(
                        !(next.status == BookingStatus::Pending
                            && next.payment_status == PaymentStatus::Paid),
                        "reached paid while pending via {:?}",
                        state
                    );
                    reached.push(next);
                }
            }
            frontier = reached;
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        for payment_status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(
                PaymentStatus::parse(payment_status.as_str()),
                Some(payment_status)
            );
        }
        assert_eq!(BookingStatus::parse("archived"), None);
        assert_eq!(PaymentStatus::parse("chargeback"), None);
    }
}
