mod auth;
mod health;
mod pipeline;
mod trace;
mod user;
