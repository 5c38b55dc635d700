// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export store ports and their adapters

pub mod favorite_repository;
pub mod memory;
pub mod profile_repository;
pub mod store;

pub use favorite_repository::*;
pub use memory::*;
pub use profile_repository::*;
pub use store::*;
