//! Model Context Protocol surface over stdio.
pub mod server;
pub mod tools;
