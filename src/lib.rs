pub mod config;
pub mod data;
pub mod derive;
pub mod engine;
pub mod error;
mod io;
pub mod polars_ext;
pub mod prelude;
pub mod view;
