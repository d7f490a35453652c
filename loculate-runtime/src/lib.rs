pub mod bus;
pub mod config_store;
pub mod defaults;
pub mod fs;
pub mod menus;
pub mod proxy_client;
pub mod store;
