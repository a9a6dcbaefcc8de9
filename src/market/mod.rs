pub mod cache;
pub mod feed;
pub mod fetch;
pub mod service;
pub mod store;
pub mod synthetic;
pub mod types;
