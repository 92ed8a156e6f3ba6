//! Live crisis impact prediction core.
//!
//! Given a tracked crisis, this crate gathers heterogeneous real-time
//! signals (weather, news, official alerts, satellite-derived estimates,
//! and generated background context) concurrently, renders them into a
//! single structured prompt, sends the prompt to a generative text backend
//! constrained to return JSON, defensively decodes the answer, and caches
//! the result keyed by crisis identifier for a UI layer to read reactively.

mod app;
pub mod model;
pub mod service;
pub mod signal;

pub use app::{CoreInitError, PredictionCore};
pub use model::{Config, Coordinates, Crisis, CrisisPrediction, HeatmapPoint, Polygon, SignalBag};
pub use service::{
    CrisisFeedClient, CrisisSource, DataAggregator, GenerativeBackend, HttpGenerativeBackend,
    PredictionClient, PredictionOrchestrator, PredictionOutcome, PredictionStatus,
    PredictionStore, StaticCrisisSource,
};
pub use signal::SignalSource;
