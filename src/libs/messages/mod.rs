//! User-facing text. Every message the tracker prints, logs or returns as a
//! warning is a [`Message`] variant; its wording lives in `display.rs`.

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;
