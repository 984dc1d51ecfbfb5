pub mod assemble;
pub mod config;
pub mod error;
pub mod group;
pub mod io;
pub mod log;
pub mod metrics;
pub mod module;
pub mod paths;
pub mod recommend;
pub mod session;
pub mod split;
pub mod types;

pub use error::{DevError, Result};
