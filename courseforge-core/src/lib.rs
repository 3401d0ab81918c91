//! Courseforge Core
//!
//! Core types and abstractions shared by the courseforge services.
//!
//! This crate contains:
//! - Domain types: courses, their status state machine and generated layouts
//! - DTOs: request/response bodies of the layout endpoint
//! - Store: the persistence contract plus an in-memory implementation

pub mod domain;
pub mod dto;
pub mod store;
