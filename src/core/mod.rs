pub mod chat;
pub mod config;
pub mod lifecycle;
pub mod persistence;
pub mod scan;
pub mod terminal;
