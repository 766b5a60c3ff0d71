pub mod sim_config;

pub use self::sim_config::*;
