pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod repositories;
