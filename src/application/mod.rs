//! Use cases and the ports (traits) they depend on. Connector-layer adapters
//! implement the ports; nothing in this module depends on a concrete backend.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
