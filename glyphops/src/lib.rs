//! Command line front end for glyphops-rec.

pub mod cli;
pub mod config;
pub mod rec;
pub mod report;
