//! Query complexity classification.

pub mod analyzer;
pub mod profile;

pub use analyzer::QueryComplexityAnalyzer;
pub use profile::{ComplexityBand, ComplexityLevel, ComplexityProfile, GENERAL_DOMAIN};
