// The bookings table is owned (and migrated) by booking-service; it is
// declared here as well because payment confirmation flips its payment
// status in the same database.
diesel::table! {
    bookings (id) {
        id -> Uuid,
        listing_id -> Uuid,
        room_id -> Nullable<Uuid>,
        guest_id -> Uuid,
        host_id -> Uuid,
        property_type -> Varchar,
        check_in -> Date,
        check_out -> Date,
        num_guests -> Int4,
        total_price -> Numeric,
        commission_amount -> Numeric,
        status -> Varchar,
        payment_status -> Varchar,
        cancel_reason -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        booking_id -> Uuid,
        amount -> Numeric,
        payment_method -> Varchar,
        reference -> Nullable<Varchar>,
        status -> Varchar,
        processed_at -> Nullable<Timestamptz>,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    wallet_entries (id) {
        id -> Uuid,
        host_id -> Uuid,
        booking_id -> Uuid,
        amount -> Numeric,
        entry_type -> Varchar,
        reference -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    bookings,
    payments,
    wallet_entries,
);
