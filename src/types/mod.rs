//! Shared vocabulary: repository identities, game versions, release channels.
//!
//! Everything in here is a plain value object. Creation is cheap, nothing is
//! mutated after construction.

mod repository;
mod version;

pub use repository::*;
pub use version::*;
