pub mod driver;
pub mod element;
pub mod session;
