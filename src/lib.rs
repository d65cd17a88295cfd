//! View engine for decoded USB captures.
//!
//! A [`capture::Capture`] holds the flat arrays a decoder produced. Two
//! read-only views sit on top of it: the lazily built [`tree::EventTree`]
//! (timeline → transfer → transaction → packet) and the per-record
//! [`tables`]. Both derive their display values through [`format`].

pub mod capture;
pub mod error;
pub mod format;
pub mod tables;
pub mod tree;

pub use error::{CaptureError, ViewError};
