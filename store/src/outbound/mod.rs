//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: storage media (a directory of JSON files, process
//!   memory) and the local blob uploader built on the record store.
//!
//! Adapters translate between domain types and their storage representation.
//! They contain no business logic.

pub mod persistence;
