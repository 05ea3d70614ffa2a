//! Route handlers, grouped by surface.

pub mod admin;
pub mod public;
pub mod qr;
