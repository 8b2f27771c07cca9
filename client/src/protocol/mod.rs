pub mod client;
pub mod color;
pub mod models;
