// src/handlers/mod.rs

pub mod auth;
pub mod curriculum;
pub mod material;
pub mod quiz;
pub mod recommendation;
pub mod report;
pub mod score;
