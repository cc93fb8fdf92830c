mod health;
mod jobs;
mod orders;

pub use health::*;
pub use jobs::*;
pub use orders::*;
