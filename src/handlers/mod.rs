// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod favorites;
pub mod health;
pub mod identity;
pub mod preferences;
pub mod restaurants;
pub mod roulette;

pub use favorites::config as favorites_config;
pub use health::config as health_config;
pub use identity::*;
pub use preferences::config as preferences_config;
pub use restaurants::config as restaurants_config;
pub use roulette::config as roulette_config;
