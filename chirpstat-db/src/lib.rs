pub mod client;
pub mod favorites;
mod query;
mod record;
