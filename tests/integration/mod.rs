//! Integration tests module
//!
//! This module organizes all integration tests for the timeplayer application.

// Import individual test modules
pub mod audio_test;
pub mod config_test;
pub mod service_test;
