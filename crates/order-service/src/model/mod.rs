//! Domain data structures.
//!
//! Pure values with no runtime behaviour. [`Order`] is hosted by the shard framework; the
//! other types are its attributes.

pub mod order;

pub use order::*;
