pub mod project;
pub mod session;
pub mod user;
