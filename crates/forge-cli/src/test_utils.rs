use std::fs;
use std::path::{Path, PathBuf};

const DEMO_TDB: &str = include_str!("../../../demos/pt-w/pt-w.tdb");
const DEMO_ZPF_1: &str = include_str!("../../../demos/pt-w/data/zpf_1.yaml");
const DEMO_ZPF_2: &str = include_str!("../../../demos/pt-w/data/zpf_2.yaml");
const DEMO_PROJECT: &str = include_str!("../../../demos/pt-w/phaseforge.toml");

/// Copies the Pt-W demo project under `root` and returns the project file path.
pub fn write_demo_project(root: &Path) -> PathBuf {
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(root.join("pt-w.tdb"), DEMO_TDB).unwrap();
    fs::write(data_dir.join("zpf_1.yaml"), DEMO_ZPF_1).unwrap();
    fs::write(data_dir.join("zpf_2.yaml"), DEMO_ZPF_2).unwrap();

    let project = root.join("phaseforge.toml");
    fs::write(&project, DEMO_PROJECT).unwrap();
    project
}
