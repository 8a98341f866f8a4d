//! Chat dispatch building blocks: request payload, transport selection,
//! output acceptance and the local fallback responder.

pub mod fallback;
mod outcome;
mod request;
mod transport;

pub use fallback::{FallbackKind, Topic, classify, fallback_reply};
pub use outcome::{InvocationOutcome, MANGLED_TEXT_SENTINELS, RejectReason};
pub use request::ChatRequest;
pub use transport::{
    FILE_SCHEME_MARKER, FILE_TRANSPORT_THRESHOLD_BYTES, PlatformFamily, TransportMode,
    select_transport,
};
