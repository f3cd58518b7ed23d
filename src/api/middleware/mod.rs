//! API middleware.
//!
//! Execution order (outermost → innermost) on admin routes:
//! 1. Access log: method, path, status, latency
//! 2. Auth validator: bearer session, injects `AdminContext`

pub mod audit;
pub mod auth;
