//! Courseforge Server
//!
//! Hosts the layout-generation endpoint and the Postgres-backed course store.
//! The binary also runs the layout poller in the same process.

pub mod api;
pub mod config;
pub mod db;
pub mod generator;
pub mod repository;
pub mod service;
