// Service exports
pub mod memory;
pub mod postgres;
pub mod recommendation;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use recommendation::{
    CollaborativeRecommendations, RecommendError, RecommendationService, Recommendations,
};
pub use store::{RecommendationStore, StoreError};
