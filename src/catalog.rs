pub mod display;
pub mod filter;
pub mod store;
