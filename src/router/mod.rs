pub mod encoder;
pub mod generator;
pub mod orchestrator;
pub mod selector;

pub use encoder::encode_route;
pub use generator::{CandidateGenerator, CandidateSet};
pub use orchestrator::{BestQuote, Discovery, DiscoveryTier, QuoteEngine};
pub use selector::{rank, select_best};
