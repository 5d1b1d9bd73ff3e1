//! Core pipeline orchestration and document assembly for labbook.
//!
//! This crate ties together discovery, archiving and fragment extraction into
//! the end-to-end run that produces the combined lab document.

pub mod assembler;
pub mod pipeline;
