//! Event envelope, closed event-type taxonomy, payload schemas, and the
//! shared consume-process-publish support code used by every saga
//! participant.

pub mod envelope;
pub mod event_type;
pub mod payloads;
pub mod runtime;
pub mod validate;

pub use envelope::{EventEnvelope, EventMetadata};
pub use event_type::{EventType, Topic};
pub use validate::validate_envelope_fields;
