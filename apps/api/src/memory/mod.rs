//! History memory: embedding, vector indexing and similarity retrieval of a
//! user's past posts and feedback on generated drafts.
//!
//! Writes are mirrored from the relational store (`capture`); reads map vector
//! matches back to relational rows (`retrieval`).

pub mod capture;
pub mod chroma;
pub mod embedder;
pub mod index;
pub mod retrieval;
