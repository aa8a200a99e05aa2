//! Core library for the unit-config-cleaner command line application.
//!
//! The library cleans tabular unit inventories (Tower, Unit and Corporate
//! columns): it flags suspicious Unit values, builds a display identifier per
//! row, collapses duplicates on request, and writes the cleaned table back out.
//! IO adapters live under [`unitconfig::cleaner::io`], the table model inside
//! [`unitconfig::cleaner::model`], the row rules in
//! [`unitconfig::cleaner::validate`], [`unitconfig::cleaner::identifier`] and
//! [`unitconfig::cleaner::dedup`], and the resumable orchestration under
//! [`unitconfig::cleaner::pipeline`] and [`unitconfig::cleaner::session`].

pub mod unitconfig;

pub use unitconfig::cleaner::{
    Cleaner, CleanerConfig, Result, Session, ToolError, columns, config, dedup, error, gate,
    identifier, io, model, pipeline, session, summary, validate,
};
