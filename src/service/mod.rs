pub mod aggregator;
pub mod feed;
pub mod generative;
pub mod orchestrator;
pub mod prediction;
pub mod prompts;
pub mod store;

pub use aggregator::DataAggregator;
pub use feed::{CrisisFeedClient, CrisisSource, FeedError, StaticCrisisSource};
pub use generative::{GenerateRequest, GenerativeBackend, GenerativeError, HttpGenerativeBackend};
pub use orchestrator::{
    OrchestratorError, PredictionOrchestrator, PredictionOutcome, PredictionStatus,
};
pub use prediction::{PredictionClient, PredictionError};
pub use store::PredictionStore;
