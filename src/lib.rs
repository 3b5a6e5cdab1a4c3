pub mod actions;
pub mod api;
pub mod auth;
pub mod browser;
pub mod cli;
pub mod error;
pub mod fixtures;
pub mod pages;
pub mod reconcile;
pub mod report;
pub mod scenario;
pub mod trace;
pub mod wait;
