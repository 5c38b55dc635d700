// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export engine components

pub mod cache;
pub mod clock;
pub mod favorites;
pub mod geo;
pub mod location;
pub mod overpass_client;
pub mod place_provider;
pub mod preference_filter;
pub mod profile_service;
pub mod roulette_service;
pub mod selection_engine;

pub use cache::*;
pub use clock::*;
pub use favorites::*;
pub use location::*;
pub use overpass_client::*;
pub use place_provider::*;
pub use preference_filter::*;
pub use profile_service::*;
pub use roulette_service::*;
pub use selection_engine::*;
