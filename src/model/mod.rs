pub mod admin;
pub mod auth;
pub mod candidate;
pub mod seed;
pub mod theme;
pub mod voter;
