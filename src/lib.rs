// Library for tests to access modules

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod docker_repo;
pub mod error;
pub mod format;
pub mod inspector;
pub mod lister;
pub mod models;
pub mod publisher;
pub mod routes;
pub mod sampler;
pub mod worker;
