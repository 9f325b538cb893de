pub mod application;
pub mod entity;
pub mod vacancy;
