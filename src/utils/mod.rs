pub mod credentials;
pub mod files;
pub mod names;
pub mod settings;
