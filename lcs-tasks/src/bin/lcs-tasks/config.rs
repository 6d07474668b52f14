use std::path::{Path, PathBuf};

use figment::providers::{Format as _, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// File name searched for, without extension.
const CONFIG_FILE: &str = ".lcs-tasks";

/// Default `make -j` parallelism.
const DEFAULT_JOBS: u32 = 8;
/// SWD clock used by the programmer when `--config` is not given, in Hz.
const DEFAULT_SWD_FREQUENCY: u32 = 4_000_000;
/// External loader used for the QSPI flash.
const DEFAULT_EXTERNAL_LOADER: &str = "STM32F746.stldr";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Checkout of the toolchain repository. `TOOLCHAIN_REPO` takes precedence.
    pub toolchain_repo: Option<PathBuf>,
    pub jobs: u32,
    pub swd_frequency: u32,
    pub external_loader: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toolchain_repo: None,
            jobs: DEFAULT_JOBS,
            swd_frequency: DEFAULT_SWD_FREQUENCY,
            external_loader: DEFAULT_EXTERNAL_LOADER.to_string(),
        }
    }
}

/// Loads the configuration from the home directory and the current directory, in that order.
pub fn load_config() -> anyhow::Result<Config> {
    let mut paths = Vec::new();
    if let Some(home) = directories::UserDirs::new().map(|user| user.home_dir().to_path_buf()) {
        paths.push(home);
    }
    paths.push(PathBuf::from("."));

    load_config_from(&paths[..])
}

/// Merges the configuration files found in `paths`. Later paths override earlier ones.
pub fn load_config_from(paths: &[impl AsRef<Path>]) -> anyhow::Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    for path in paths {
        let path = path.as_ref();
        figment = figment
            .merge(Toml::file(path.join(format!("{CONFIG_FILE}.toml"))))
            .merge(Json::file(path.join(format!("{CONFIG_FILE}.json"))))
            .merge(Yaml::file(path.join(format!("{CONFIG_FILE}.yaml"))))
            .merge(Yaml::file(path.join(format!("{CONFIG_FILE}.yml"))));
    }

    let config = figment.extract::<Config>()?;

    Ok(config)
}
