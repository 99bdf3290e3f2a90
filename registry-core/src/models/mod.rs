mod project;
mod researcher;

pub use project::*;
pub use researcher::*;
