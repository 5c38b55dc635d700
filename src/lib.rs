// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Restaurant discovery and roulette engine plus its HTTP adapter

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
