/// Server-pushed events.
pub mod event;
/// Text framing of events.
pub mod frame;
/// Client requests.
pub mod request;
/// Request field validation.
pub mod validation;
