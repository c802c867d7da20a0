//! Collection stores over the key-value storage backend.
//!
//! # Responsibility
//! - Provide durable CRUD over the active/archived task collections and the
//!   category/settings side collections.
//! - Keep serialization details inside the persistence boundary.
//!
//! # Invariants
//! - Reads are total: storage failures and malformed blobs degrade to an
//!   empty collection (or defaults) plus an error log, never a panic.
//! - Every mutation is a full read-modify-write of the affected collection.
//! - Stores are policy-free; lifecycle preconditions live in the services.

pub mod side_store;
pub mod task_store;
