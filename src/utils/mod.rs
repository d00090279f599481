//! Utility functions and helpers.
//!
//! Pure normalizers for the heterogeneous duration and date encodings the
//! upstream hands back. Nothing in here performs I/O or returns an error:
//! unparsable input collapses to `0` or `None`.

pub mod date;
pub mod duration;
pub mod text;

pub use date::{extract_date_from_text, format_date, parse_timestamp, resolve_event_date};
pub use duration::{format_duration, parse_duration};
