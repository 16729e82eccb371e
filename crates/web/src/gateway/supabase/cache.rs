//! Cache keys for collection point listings.

use clique_recicle_core::UserId;

use crate::gateway::PointFilter;

/// Cache key for listing responses.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    AllPoints,
    AgentPoints(UserId),
}

impl From<PointFilter> for CacheKey {
    fn from(filter: PointFilter) -> Self {
        filter.agent_id.map_or(Self::AllPoints, Self::AgentPoints)
    }
}
