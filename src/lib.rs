pub mod api;
pub mod core;
pub mod error;
pub mod expr;
pub mod io;
pub mod store;
