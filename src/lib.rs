// Library for tests to access modules

pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod repo;
pub mod routes;
pub mod scheduler;
pub mod version;
