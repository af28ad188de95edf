pub mod roster;
pub mod serve;

// Re-export command functions for convenience
pub use roster::{init_db, preview, publish, RosterParams};
pub use serve::serve;
