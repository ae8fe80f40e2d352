pub mod auth_redirect;
pub mod error_pages;
