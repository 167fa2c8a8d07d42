//! Diesel schema for subscriber registration persistence.

diesel::table! {
    /// Browser push subscription records.
    push_subscriptions (id) {
        /// Internal registration identifier.
        id -> Uuid,
        /// Owning user identifier.
        owner_id -> Uuid,
        /// Owning tenant identifier, null for users without one.
        tenant_id -> Nullable<Uuid>,
        /// Unique push service endpoint URL.
        #[max_length = 2048]
        endpoint -> Varchar,
        /// Base64url uncompressed P-256 public key.
        #[max_length = 100]
        p256dh -> Varchar,
        /// Base64url 16-byte auth secret.
        #[max_length = 32]
        auth_secret -> Varchar,
        /// Diagnostic user agent.
        user_agent -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last overwrite timestamp.
        updated_at -> Timestamptz,
    }
}
