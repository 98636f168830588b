pub mod applier;
pub mod color_policy;
pub mod store;
