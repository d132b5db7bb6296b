//! Domains module containing business logic organized by bounded contexts.
//!
//! Only tools are exposed today; sessions and connection context live in
//! `core` because every transport shares them.

pub mod tools;
