//! Entity lifecycle engine for the Huddle team-collaboration backend.
//!
//! Three concerns live here:
//! - soft-delete with cascade over the content hierarchy (boards, posts,
//!   comments, attachments)
//! - account withdrawal with a grace period during which the account can
//!   be restored
//! - a scheduled cleanup worker that permanently erases accounts whose
//!   grace period has elapsed, together with their related data

pub mod cleanup;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod withdrawal;

#[cfg(test)]
mod tests;
