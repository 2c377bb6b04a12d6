//! Remote project API (GraphQL)

pub mod client;
pub mod schema;
