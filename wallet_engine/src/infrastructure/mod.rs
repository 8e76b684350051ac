pub mod cache;
pub mod notification;
pub mod persistence;
pub mod webhook;
