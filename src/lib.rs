pub mod config;
pub mod consts;
pub mod generation;
pub mod prompts;
pub mod rewrite;
pub mod server;
pub mod tone;
