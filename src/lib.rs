//! # portfolio-rag: chatbot backend for a portfolio site
//!
//! Indexes the site's text content into a local vector store, retrieves the
//! passages most relevant to a visitor's question, and asks Gemini to answer
//! from that context only. Questions in other languages are translated for
//! retrieval and answered in the visitor's language.
//!
//! ## Architecture
//!
//! - **[`config`]**: JSON + environment configuration
//! - **[`db`]**: SQLite + sqlite-vec vector store (upsert, delete, cosine search)
//! - **[`embedder`]**: Text embedding via the Gemini API
//! - **[`llm`]**: Text generation via the Gemini API
//! - **[`indexer`]**: Content-file scanning, passage splitting, differential sync
//! - **[`rag`]**: Query embedding + similarity search + context assembly
//! - **[`language`]**, **[`translate`]**: Language detection and name-preserving translation
//! - **[`prompt`]**, **[`chat`]**: Prompt assembly and the question-answering pipeline
//! - **[`api`]**, **[`state`]**: axum routes and shared state

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod embedder;
pub mod indexer;
pub mod language;
pub mod llm;
pub mod prompt;
pub mod rag;
pub mod state;
pub mod translate;
