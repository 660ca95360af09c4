#![deny(unsafe_op_in_unsafe_fn)]
#![warn(rust_2018_idioms, clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::must_use_candidate,
    clippy::unreadable_literal
)]

pub mod doc;
pub mod envelope;

pub(crate) mod block;
pub(crate) mod internals;
pub(crate) mod utils;

pub use doc::{Document, Error, FormatError, Result};
pub use envelope::{Envelope, EnvelopeError};
