pub mod extractor;
pub mod password;
pub mod permissions;
pub mod session;
