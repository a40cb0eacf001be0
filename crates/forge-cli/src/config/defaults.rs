use std::path::PathBuf;

pub struct DefaultsConfig {
    pub pressure: f64,
    pub temperature: f64,
    pub data_dir: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            pressure: 101325.0,
            temperature: 298.15,
            data_dir: PathBuf::from("data"),
        }
    }
}
