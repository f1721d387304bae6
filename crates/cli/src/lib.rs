pub mod cli;
pub mod console;
pub mod error;
pub mod signals;
