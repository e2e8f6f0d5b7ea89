// src/payments/mod.rs

pub mod stars;
pub mod ton;
