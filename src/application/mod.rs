pub mod app_error;
pub mod jwt;
pub mod security;
pub mod use_cases;
pub mod validators;
