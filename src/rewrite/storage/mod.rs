pub mod marker;

pub use marker::{MarkerStats, ProcessedMarkers};
