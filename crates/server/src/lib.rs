pub mod routes;
pub mod admin;
pub mod startup;
pub mod errors;

pub use startup::run;
