pub mod backend;
pub mod board;
pub mod catalog;
pub mod config;
pub mod error;
pub mod forms;
pub mod logging;
pub mod media;
pub mod model;
pub mod session;
pub mod supabase;
