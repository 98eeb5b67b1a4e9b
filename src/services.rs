pub mod confirm;
pub mod form;
pub mod tags;
pub mod tasks;
pub mod view;
