//! Council formation and caching.

pub mod cache;
pub mod entities;
pub mod formation;

pub use cache::{CouncilCache, DEFAULT_COUNCIL_CACHE_CAPACITY};
pub use entities::{Council, CouncilId, CouncilStatus};
pub use formation::{
    CandidateScore, CouncilBounds, CouncilFormationService, FormationConfig, FormationWeights,
    TeamSelection,
};
