#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diagram;
pub mod error;
pub mod extract;
pub mod ir;
pub mod layout;
pub mod llm;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod session;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use error::Error;
