pub mod artifact;
pub mod ast;
pub mod cache;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod namespace;
pub mod parser;
pub mod series;
pub mod settings;
pub mod stdlib;
pub mod token;
pub mod validator;
