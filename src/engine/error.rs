use ulid::Ulid;

use crate::model::BookingStatus;
use crate::store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// Property type is administratively closed for new bookings.
    NotBookable(Ulid),
    CapacityExceeded {
        property_type: Ulid,
        requested: u32,
        available: u32,
    },
    InvalidStay(&'static str),
    InvalidRequest(&'static str),
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    AgentNotApproved(Ulid),
    LimitExceeded(&'static str),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::NotBookable(id) => write!(f, "property type not bookable: {id}"),
            EngineError::CapacityExceeded {
                property_type,
                requested,
                available,
            } => write!(
                f,
                "capacity exceeded on {property_type}: requested {requested}, available {available}"
            ),
            EngineError::InvalidStay(msg) => write!(f, "invalid stay: {msg}"),
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EngineError::IllegalTransition { from, to } => {
                write!(f, "illegal status transition: {from} -> {to}")
            }
            EngineError::AgentNotApproved(id) => write!(f, "agent not approved: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}
