/// Primary-key type shared by every entity; BIGSERIAL on the Postgres
/// side.
pub type DbId = i64;

/// Timestamps are stored and compared in UTC throughout.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
