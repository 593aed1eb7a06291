pub mod app_settings;
pub mod app_state;
pub mod form;
pub mod messages;
pub mod network;
