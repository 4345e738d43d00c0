//! Integration tests for the buildbox CLI.

mod common;

mod build_tests;
mod gc_tests;
