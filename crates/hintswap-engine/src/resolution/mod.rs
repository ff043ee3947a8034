pub mod candidate;
pub mod engine;
pub mod result;

pub use candidate::{Candidate, pick_candidate};
pub use engine::ResolutionEngine;
pub use result::{ResolutionResult, ResolveError};
