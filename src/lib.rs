#![forbid(unsafe_code)]

pub mod assemble;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod generator;
pub mod lesson;
pub mod library;
pub mod logging;
pub mod packet;
pub mod problems;
pub mod sanitize;
pub mod schema;
pub mod topics;
