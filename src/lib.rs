pub mod error;
pub mod ini;
pub mod models;
pub mod scripts;
pub mod security;
pub mod session;
pub mod status;
pub mod storage;
