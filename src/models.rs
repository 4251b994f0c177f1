pub mod artist;
pub mod order;
pub mod settings;
