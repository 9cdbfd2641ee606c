//! Handlers owned by the app itself (everything that is not a domain).

pub mod events;
pub mod meta;
pub mod uploads;
