pub mod registry;
pub mod vendors;
