//! Core library modules: the hours engine, query language, reporting and
//! the ambient pieces (configuration, storage, messages, errors).

pub mod comment;
pub mod config;
pub mod data_storage;
pub mod entry;
pub mod env;
pub mod error;
pub mod export;
pub mod formatter;
pub mod hours;
pub mod messages;
pub mod permission;
pub mod query;
pub mod report;
pub mod session;
pub mod summary;
pub mod ticket;
pub mod view;
