pub mod config;
pub mod fetch;
pub mod master_config;
pub mod oauth;
pub mod parameters;
pub mod resources;
pub mod transform;
