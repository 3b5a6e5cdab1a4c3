pub mod credentials;
pub mod session_cache;
