pub mod business;
pub mod endpoints;
pub mod session;
