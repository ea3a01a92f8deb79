//! Layered configuration fixtures written into a temporary directory

use poke_analysis::ConfigLoader;
use std::path::PathBuf;
use tempfile::TempDir;

/// A system layer, a user layer and a job file on disk
pub struct ConfigFiles {
    pub dir: TempDir,
    pub loader: ConfigLoader,
    pub job: PathBuf,
}

/// Write system and user layers pointing at the mock servers, plus `job_yaml` as the job file
pub fn write_config_files(
    api_uri: &str,
    ntfy_uri: &str,
    topic: &str,
    job_yaml: &str,
) -> ConfigFiles {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let system = dir.path().join("system_config.yml");
    std::fs::write(
        &system,
        format!(
            "api:\n  base_url: {api_uri}\n  timeout: 5\n\
             notifications:\n  server: {ntfy_uri}\n  timeout: 5\n"
        ),
    )
    .expect("Failed to write system config");

    let user = dir.path().join("user_config.yml");
    std::fs::write(&user, format!("ntfy_topic_name: {topic}\n"))
        .expect("Failed to write user config");

    let job = dir.path().join("job_file.yml");
    let job_dir = dir.path().join("job");
    std::fs::write(
        &job,
        format!("job_dir_path: {}\n{job_yaml}", job_dir.display()),
    )
    .expect("Failed to write job config");

    ConfigFiles {
        loader: ConfigLoader::with_layers([system, user]),
        dir,
        job,
    }
}
