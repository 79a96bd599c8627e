//! signkeep-material: split key material on disk and signing-password encryption
//!
//! Lifecycle of a material directory:
//!   1. absent                 → `ensure_material` creates it (staged, then renamed)
//!   2. present-and-consistent → every encrypt/decrypt re-derives the working key
//!   3. present-and-corrupt    → only through outside interference; detected
//!                                lazily by `load`, never repaired
//!
//! There is no way back to "absent" except deleting the directory.
//!
//! Concurrent readers are safe. Concurrent creators race to a single rename;
//! the loser discards its staging directory.

pub mod layout;
pub mod manager;
pub mod store;

pub use layout::{MaterialLayout, Slot};
pub use manager::KeyMaterialManager;
pub use store::{content_name, MaterialStore};
