mod exports;
pub use exports::*;

pub mod types;
pub mod index;
pub mod error;
pub mod grid;
pub mod pose;
pub mod obstacle;
pub mod system_matrix;
pub mod projector;
pub mod operator;
pub mod dynamic;
pub mod config;
pub mod io;
pub mod utils;
