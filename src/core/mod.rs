pub mod config;
pub mod counter;
pub mod engine;
pub mod error;
pub mod external;
pub mod io;
pub mod model;
