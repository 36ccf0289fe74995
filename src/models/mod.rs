// src/models/mod.rs

pub mod curriculum;
pub mod material;
pub mod quiz;
pub mod recommendation;
pub mod score;
pub mod user;
