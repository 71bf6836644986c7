//! Boundary to the external hosted record store.
//!
//! The ledger reads property types and bookings through this trait at
//! hydration time and writes bookings through it inside the reserve path.
//! The store is a collaborator, not part of the engine: availability and
//! pricing never touch it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::limits::{READ_RETRY_ATTEMPTS, READ_RETRY_BASE_MS};
use crate::model::*;
use crate::observability;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient: the store could not be reached. Retryable.
    Unavailable(String),
    /// The store refused the operation (constraint, unknown record). Not retryable.
    Rejected(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StoreError::Rejected(msg) => write!(f, "store rejected operation: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The external store's surface, as narrow as the engine needs it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All property types currently administered, bookable or not.
    async fn fetch_property_types(&self) -> Result<Vec<PropertyType>, StoreError>;

    /// All bookings with their room allocations, including cancelled and
    /// soft-deleted ones. The ledger filters, the store does not.
    async fn fetch_bookings(&self) -> Result<Vec<BookingRecord>, StoreError>;

    async fn insert_booking(&self, record: &BookingRecord) -> Result<(), StoreError>;

    async fn set_booking_status(&self, id: Ulid, status: BookingStatus) -> Result<(), StoreError>;

    /// Soft delete. Records are never physically removed.
    async fn set_booking_deleted(&self, id: Ulid) -> Result<(), StoreError>;
}

/// Run a store read, retrying transient failures with doubling backoff.
///
/// Exhausted retries propagate the error. Callers must treat that as
/// "availability unknown", never as zero rooms or zero cost.
pub async fn retry_read<T, F, Fut>(mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut delay = Duration::from_millis(READ_RETRY_BASE_MS);
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < READ_RETRY_ATTEMPTS => {
                metrics::counter!(observability::STORE_RETRIES_TOTAL).increment(1);
                tracing::warn!("store read failed (attempt {attempt}), retrying: {e}");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Reference store backed by concurrent maps. Used for embedding and tests;
/// a hosted-store client implements the same trait.
pub struct InMemoryStore {
    property_types: DashMap<Ulid, PropertyType>,
    bookings: DashMap<Ulid, BookingRecord>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            property_types: DashMap::new(),
            bookings: DashMap::new(),
        }
    }

    pub fn seed_property_type(&self, property: PropertyType) {
        self.property_types.insert(property.id, property);
    }

    pub fn seed_booking(&self, record: BookingRecord) {
        self.bookings.insert(record.id, record);
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    pub fn booking(&self, id: &Ulid) -> Option<BookingRecord> {
        self.bookings.get(id).map(|e| e.value().clone())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch_property_types(&self) -> Result<Vec<PropertyType>, StoreError> {
        Ok(self.property_types.iter().map(|e| e.value().clone()).collect())
    }

    async fn fetch_bookings(&self) -> Result<Vec<BookingRecord>, StoreError> {
        Ok(self.bookings.iter().map(|e| e.value().clone()).collect())
    }

    async fn insert_booking(&self, record: &BookingRecord) -> Result<(), StoreError> {
        if self.bookings.contains_key(&record.id) {
            return Err(StoreError::Rejected(format!("duplicate booking {}", record.id)));
        }
        self.bookings.insert(record.id, record.clone());
        Ok(())
    }

    async fn set_booking_status(&self, id: Ulid, status: BookingStatus) -> Result<(), StoreError> {
        let mut record = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("unknown booking {id}")))?;
        record.status = status;
        for allocation in &mut record.allocations {
            allocation.status = status;
        }
        Ok(())
    }

    async fn set_booking_deleted(&self, id: Ulid) -> Result<(), StoreError> {
        let mut record = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("unknown booking {id}")))?;
        record.deleted = true;
        for allocation in &mut record.allocations {
            allocation.deleted = true;
        }
        Ok(())
    }
}
