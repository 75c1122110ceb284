pub mod apis;
pub mod arguments;
pub mod config;
pub mod logger;
pub mod prices;
pub mod webserver;
