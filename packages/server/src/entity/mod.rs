pub mod course;
pub mod instructor;
pub mod semester_term;
pub mod trace;
pub mod user;
