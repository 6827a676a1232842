//! Consolidated test modules.
//!
//! End-to-end scenarios exercising the withdrawal service, the cascade, and
//! the cleanup worker together against an in-memory database.
