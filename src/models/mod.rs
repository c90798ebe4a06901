//! Data models for the course catalog.
//!
//! Wire shapes are camelCase JSON; derived fields (URLs) are filled at read time.

mod channel;
mod course;
mod tag;

pub use channel::*;
pub use course::*;
pub use tag::*;
