pub mod color;
pub mod config;
pub mod engine;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;
pub mod reconcile;
pub mod regions;

pub use config::VisionConfig;
pub use engine::EngineContext;
pub use pipeline::VisionPipeline;
