// Modal rendering modules
mod utils;
mod composer;
mod posts;
mod help;

// Re-export all public functions
pub use composer::*;
pub use posts::*;
pub use help::*;
