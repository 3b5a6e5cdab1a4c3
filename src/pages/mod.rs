//! Page objects: one stateless type per logical screen.
//!
//! Each page owns its own `selectors` registry. Selectors are not shared
//! between pages even when two pages target the same markup.

pub mod cart;
pub mod context;
pub mod home;
pub mod login;
pub mod product;
