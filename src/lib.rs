#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod cli;
pub mod config;
pub mod error;
pub mod notes;
pub mod paths;
pub mod platform;
pub mod report;
pub mod service;
