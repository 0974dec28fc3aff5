//! # cmp-core
//!
//! Shared types and utilities for crypto-msg-parser.
//!
//! This crate provides the building blocks used by the parser engine and the
//! command-line front end: the market type / message type enumerations, the
//! canonical record structures every exchange is normalized into, layered
//! configuration, and the logging setup.

pub mod config;
pub mod logging;
pub mod types;
