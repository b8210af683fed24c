pub mod course;
pub mod document;
pub mod formation;
pub mod notification;
pub mod schedule;
pub mod session;
pub mod student;
pub mod user;
