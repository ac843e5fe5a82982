//! Local control surface for a running texpand daemon.

pub mod api;
pub mod server;

pub use api::ControlState;
pub use server::http_server::{bind_control_server, start_control_server};
