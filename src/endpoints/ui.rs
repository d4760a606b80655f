pub mod pages;
pub mod routes;
