//! Port traits decoupling the engines from storage, config and rendering.

pub mod config_port;
pub mod data_port;
pub mod prediction_port;
pub mod report_port;
