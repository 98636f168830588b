pub mod client;
pub mod control_server;
