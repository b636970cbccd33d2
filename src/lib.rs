//! Travel-planning backend: projects of catalog places with visit tracking.

pub mod application;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod infra;
