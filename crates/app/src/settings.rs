//! # 配置加载
//!
//! 按以下顺序叠加，后者覆盖前者：
//! 1. `AppConfig` 内置默认值
//! 2. `<dir>/default.toml` (可选)
//! 3. `<dir>/local.toml` (可选)
//! 4. `BLACKGEM__` 前缀的环境变量，层级以 `__` 分隔，如 `BLACKGEM__SERVER__PORT=9000`

use blackgem_core::config::AppConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;

pub const ENV_PREFIX: &str = "BLACKGEM";

/// 默认的环境变量来源
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// # Summary
/// 从配置目录与指定的环境变量来源加载配置。
///
/// # Arguments
/// * `dir` - 配置文件所在目录，文件缺失时跳过。
/// * `env` - 环境变量来源，测试时可通过 `Environment::source` 注入。
///
/// # Returns
/// 叠加后的 `AppConfig`；文件格式错误或字段类型不匹配时返回 `ConfigError`。
pub fn load_from(dir: &Path, env: Environment) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::from(dir.join("default.toml")).required(false))
        .add_source(File::from(dir.join("local.toml")).required(false))
        .add_source(env)
        .build()?
        .try_deserialize()
}

/// 使用进程环境变量加载配置
pub fn load(dir: &Path) -> Result<AppConfig, ConfigError> {
    load_from(dir, environment())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(dir.path(), env_of(&[])).unwrap();

        assert_eq!(config.server.bind_addr(), "127.0.0.1:8050");
        assert_eq!(config.forecast.default_symbol, "COIN");
        assert_eq!(config.forecast.horizon_days, 90);
        assert_eq!(config.market.timeout_secs, 10);
    }

    #[test]
    fn test_local_file_and_env_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\n\n[forecast]\ndefault_symbol = \"MSFT\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("local.toml"),
            "[forecast]\nhorizon_days = 30\n\n[market]\nhistory_start = \"2020-01-01\"\n",
        )
        .unwrap();

        let config = load_from(
            dir.path(),
            env_of(&[
                ("BLACKGEM__SERVER__PORT", "9100"),
                ("BLACKGEM__SERVER__ASSETS_DIR", "/srv/assets"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.assets_dir, "/srv/assets");
        assert_eq!(config.forecast.default_symbol, "MSFT");
        assert_eq!(config.forecast.horizon_days, 30);
        assert_eq!(
            config.market.history_start,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.toml"), "[server]\nport = \"eighty\"\n").unwrap();

        assert!(load_from(dir.path(), env_of(&[])).is_err());
    }
}
