//! Host process for the Book Swap backend: HTTP routes, CORS and the
//! community chat on one listener.

pub mod app;
pub mod cli;

pub use app::App;
