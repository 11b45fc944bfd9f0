//! Capability context.
//!
//! The [`Cx`] type is the capability that lets a promise cell defer work.
//! Cells never reach for an ambient event loop: the scheduler and the
//! configuration they use are the ones carried by the `Cx` they were created
//! with, and cells derived via `then` inherit their parent's `Cx`.

pub mod cx;

pub use cx::Cx;
