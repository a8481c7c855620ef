//! # Web API Request Handlers

pub mod calls;
pub mod contacts;
pub mod health;
