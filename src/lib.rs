//! # kbrag: document knowledge base with retrieval-augmented answers
//!
//! Ingests PDF, DOCX and plain-text uploads into a persisted vector index,
//! then answers questions with a hosted language model grounded on the
//! most similar chunks.
//!
//! ## Architecture
//!
//! - **[`loader`]**: Extension-dispatched text extraction (PDF per page, DOCX, UTF-8 text)
//! - **[`chunker`]**: Fixed-size sliding-window chunking with overlap
//! - **[`embedder`]**: Embedding trait, Gemini and mock implementations
//! - **[`store`]**: SQLite + sqlite-vec vector store (add, retrieve, persist)
//! - **[`ingest`]**: Batch staging, parallel loading and cleanup
//! - **[`generator`]**: Language model trait, Gemini and mock implementations
//! - **[`answer`]**: Prompt construction and answer generation
//! - **[`catalog`]**: Listing and archiving of source documents
//! - **[`gemini`]**: Blocking HTTP client for the Generative Language API
//! - **[`config`]**: Configuration loading and validation
//! - **[`app`]**: Service wiring shared by the CLI and MCP surfaces
//! - **[`mcp`]**: MCP server with 3 tool handlers (stdio transport via rmcp)

pub mod answer;
pub mod app;
pub mod catalog;
pub mod chunker;
pub mod config;
pub mod embedder;
pub mod gemini;
pub mod generator;
pub mod ingest;
pub mod loader;
pub mod mcp;
pub mod store;
