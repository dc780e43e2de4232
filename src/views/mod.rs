pub mod dashboard;
pub mod health;
pub mod ini_editor;
pub mod layout;
pub mod login;
pub mod servers;
