//! Navigation controllers and geometry utilities.
//!
//! The loiter controller holds a 3-D target through the
//! position→velocity→acceleration→lean-angle cascade; the waypoint
//! controller advances a target along an origin→destination track and
//! reuses the same cascade. Both read the position/velocity estimate
//! through the [`crate::traits::InertialNav`] interface on every call.

pub mod geo;
pub mod loiter;
pub mod types;
pub mod waypoint;

pub use geo::YawFrame;
pub use loiter::LoiterController;
pub use types::{NavConfig, NavTelemetry};
pub use waypoint::WaypointController;
