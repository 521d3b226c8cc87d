//! Online metric collection: reducers and the frame collector.

mod collector;
mod sampler;

pub use collector::Collector;
pub use sampler::Sampler;
