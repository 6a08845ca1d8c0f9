pub mod connection;
pub mod constants;
pub mod link;
pub mod types;
