// Common library for shared code across the API and tests

pub mod auth;
pub mod bindings;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod formats;
pub mod models;
pub mod registry;
pub mod script;
pub mod sink;
pub mod source;
pub mod storage;
pub mod telemetry;
