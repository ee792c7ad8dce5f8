//! Canonical message shapes handed to the browser-facing layer.
//!
//! The platform's wire format (see `remote::types`) is loosely typed: every
//! message carries an optional payload object whose meaning depends on a
//! `type` string. We immediately convert those into the structs here and the
//! widget only ever sees this canonical form.

pub mod message;
pub mod payload;

pub use message::{Message, Role};
pub use payload::{CarouselAction, CarouselItem, Payload};
