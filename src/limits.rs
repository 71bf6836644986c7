//! Hard limits enforced at the mutation and query boundaries.

/// Longest acceptable stay, in nights.
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Widest occupancy-calendar window, in days.
pub const MAX_QUERY_WINDOW_DAYS: i64 = 366;

/// Most property types one booking may combine.
pub const MAX_SELECTIONS_PER_BOOKING: usize = 16;

/// Most rooms one selection may claim.
pub const MAX_ROOMS_PER_SELECTION: u32 = 50;

/// Most property types a ledger will hold.
pub const MAX_PROPERTY_TYPES: usize = 500;

/// Longest property-type name or guest label.
pub const MAX_NAME_LEN: usize = 120;

/// Stays must fall inside [MIN_VALID_YEAR, MAX_VALID_YEAR].
pub const MIN_VALID_YEAR: i32 = 2000;
pub const MAX_VALID_YEAR: i32 = 2100;

/// Transient store reads: attempts before the error propagates.
pub const READ_RETRY_ATTEMPTS: u32 = 3;

/// Initial backoff between read retries; doubles per attempt.
pub const READ_RETRY_BASE_MS: u64 = 50;
