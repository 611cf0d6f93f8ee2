//! Parameter management for the navigation core.
//!
//! Provides a bounded parameter store and the navigation parameter
//! block. Persistence is an external collaborator's concern: the host
//! loads stored values into the store at boot, and the store's dirty
//! flag tells it when a save is due.

pub mod error;
pub mod storage;
pub mod wpnav;

pub use error::ParameterError;
pub use storage::{ParamFlags, ParamValue, ParameterStore, MAX_PARAMS, PARAM_NAME_LEN};
pub use wpnav::WpNavParams;
