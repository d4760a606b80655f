pub mod routes;
pub mod schema;
