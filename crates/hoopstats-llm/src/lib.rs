pub mod client;
pub mod context;
pub mod prompt;
pub mod protocol;
