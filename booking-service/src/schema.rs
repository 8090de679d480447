diesel::table! {
    listings (id) {
        id -> Uuid,
        host_id -> Uuid,
        title -> Varchar,
        property_type -> Varchar,
        nightly_price -> Numeric,
        active -> Bool,
        created_at -> Nullable<Timestamptz>,
    }
}

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
    inquiries (id) {
        id -> Uuid,
        listing_id -> Uuid,
        guest_id -> Uuid,
        message -> Text,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    listings,
    bookings,
    inquiries,
);
