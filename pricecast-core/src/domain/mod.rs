//! Domain types for PriceCast

pub mod point;
pub mod series;

pub use point::PricePoint;
pub use series::{Series, SeriesError};

/// Symbol type alias
pub type Symbol = String;
