//! Dashboard View
//!
//! ## Lifecycle
//!
//! ```text
//! Loading ──fetch ok──▶ Loaded ──fetch ok──▶ Loaded
//!    │                    │
//!    └──fetch/update err──┴──▶ Error ──fetch ok──▶ Loaded
//! ```
//!
//! - [`Dashboard`]: the state and its synchronous transitions
//! - [`DashboardController`]: store calls feeding the state, shared by the HTTP handlers
//! - [`DashboardSession`]: the background task holding the change subscription

mod controller;
mod session;
mod state;

pub use controller::{ControllerSettings, DashboardController, RefreshOutcome};
pub use session::{DashboardSession, SessionConfig, SessionHandle};
pub use state::{Dashboard, DashboardError, DashboardView, LoadPhase};
