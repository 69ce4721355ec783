//! Comparison of ChIP-seq samples: interval-overlap and coverage-correlation
//! matrices, consensus and occupancy tables, windowed depth profiles, and
//! the plots built on top of them.

pub mod atlas;
pub mod bam;
pub mod genome;
pub mod matrix;
pub mod plot;
pub mod profile;
pub mod progress;
pub mod regions;
pub mod remote;
pub mod similarity;
