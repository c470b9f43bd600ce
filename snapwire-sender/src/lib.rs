//! # snapwire-sender — still-image delivery client
//!
//! Command-line front end for the snapwire pipeline: each image file
//! given on the command line is treated as one triggered capture,
//! downscaled and re-encoded, and delivered to the configured receiver
//! over its own TCP connection.
//!
//! Configuration lives in a TOML file; a missing file is written out
//! with defaults on first run so the operator has something to edit.

pub mod config;
