pub mod admin;
pub mod code;
