//! Data models for Roundtable

mod participant;
mod theme;

pub use participant::*;
pub use theme::*;
