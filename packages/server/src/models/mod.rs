pub mod shared;
pub mod trace;
pub mod upload;
pub mod user;
