//! Shared database repository test infrastructure
//!
//! Each repository has a test module containing shared test functions that
//! take the repo trait object, plus SQLite-specific setup using fast
//! in-memory databases with the real migrations.
