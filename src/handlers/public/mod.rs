// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service info, liveness and readiness probes, and the public boarder
// listing.

pub mod boarders;
pub mod health;

pub use boarders::list_boarders;
pub use health::{api_health, health, root};
