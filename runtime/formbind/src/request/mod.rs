//! The incoming request, as seen by the decoders.
pub use incoming::IncomingRequest;
pub use request_head::RequestHead;

mod incoming;
mod request_head;
