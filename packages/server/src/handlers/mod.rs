pub mod health;
pub mod trace;
pub mod user;
