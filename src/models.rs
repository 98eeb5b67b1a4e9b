pub mod expiry;
pub mod store;
pub mod task;
