// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod favorite;
pub mod identity;
pub mod place;
pub mod preference;
pub mod profile;
pub mod quota;

pub use favorite::*;
pub use identity::*;
pub use place::*;
pub use preference::*;
pub use profile::*;
pub use quota::*;
