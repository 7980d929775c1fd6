// handlers/protected/mod.rs - Protected handlers (signed-in session required)
//
// Mounted under /api behind the `require_auth` route layer.

pub mod session;

pub use session::current_session;
