pub mod api;
pub mod config;
pub mod domain;
pub mod facade;
pub mod infrastructure;
pub mod jobs;
pub mod support;
pub mod use_cases;
