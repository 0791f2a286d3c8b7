pub mod advisor;
pub mod fallback;

pub use advisor::TravelAdvisor;
pub use fallback::{Attempt, FallbackOrchestrator};
