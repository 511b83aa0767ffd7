pub mod core;
pub mod handbook;
pub mod page;
pub mod session;
pub mod setup;
pub mod store;
