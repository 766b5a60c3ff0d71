use lazy_static::lazy_static;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;

#[allow(non_snake_case)]
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SimSetting {
    /// "grid" 或 "cross_list"
    pub BACKEND: String,
    pub GRID_SIZE: i32,
    pub MIN_X: i32,
    pub MIN_Z: i32,
    pub MAX_X: i32,
    pub MAX_Z: i32,
    pub NPC_COUNT: i64,
    pub NPC_RANGE: f64,
    pub HERO_RANGE: f64,
    pub TPS: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Setting {
    sim: SimSetting,
}

impl Default for SimSetting {
    fn default() -> Self {
        let file_path = "aoi.toml";
        let mut file = match File::open(file_path) {
            Ok(f) => f,
            Err(e) => panic!("no such file {} exception:{}", file_path, e),
        };
        let mut str_val = String::new();
        match file.read_to_string(&mut str_val) {
            Ok(s) => s,
            Err(e) => panic!("Error Reading ApplicationConfig: {}", e),
        };
        let setting: Setting = toml::from_str(&str_val).unwrap();
        setting.sim
    }
}

lazy_static! {
    pub static ref CONFIG: SimSetting = SimSetting::default();
}
