pub mod controller;
pub mod notify;
pub mod status;
