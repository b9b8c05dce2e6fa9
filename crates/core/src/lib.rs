pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod profile;
pub mod proxy;
pub mod reasoning;
pub mod trace;
pub mod transform;
