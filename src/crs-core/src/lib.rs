//! Recognition session drivers
//!
//! Drives the CRS engine through its two supported call sequences:
//! phase-by-phase script/language identification over a batch of documents,
//! and single-call full recognition of one document into text files.

pub mod cli;
pub mod colored_logger;
pub mod config;
pub mod driver;
pub mod outputs;
pub mod report;
