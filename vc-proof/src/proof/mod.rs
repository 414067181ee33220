//! The concrete proof types: JWT proofs anchored to DIDs, and attestations
//! recorded in a NEAR contract

mod jwt;
mod near;

pub use jwt::*;
pub use near::*;
