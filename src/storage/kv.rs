use crate::error::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// 按固定键落盘的 JSON 文档存储，每个键对应 data_dir 下的一个文件。
///
/// 读失败回退默认值，写失败记录日志后吞掉，状态继续留在内存里。
/// 各键独立写入，键之间不保证一致性。
#[derive(Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .map_err(|e| AppError::InternalError(format!("无法创建数据目录: {e}")))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    /// 读取键值，文件缺失或内容损坏时返回默认值
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let path = self.key_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return default,
            Err(e) => {
                log::warn!("Failed to read storage key '{key}': {e}");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Corrupt data under storage key '{key}', using default: {e}");
                default
            }
        }
    }

    /// 写入键值，任何失败只记录日志
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_vec_pretty(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize storage key '{key}': {e}");
                return;
            }
        };

        if let Err(e) = fs::write(self.key_path(key), raw) {
            log::error!("Failed to write storage key '{key}': {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_id;
    use serde::Deserialize;

    fn temp_store() -> JsonStore {
        let dir = std::env::temp_dir().join(generate_id("pixelforge-kv-test"));
        JsonStore::open(dir).unwrap()
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: i64,
    }

    #[test]
    fn test_load_missing_key_returns_default() {
        let store = temp_store();
        let value: Vec<Sample> = store.load("missing", Vec::new());
        assert!(value.is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let store = temp_store();
        let original = Sample {
            name: "starter".to_string(),
            count: 100,
        };

        store.save("sample", &original);
        let loaded: Sample = store.load(
            "sample",
            Sample {
                name: String::new(),
                count: 0,
            },
        );
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let store = temp_store();
        std::fs::write(store.key_path("sample"), "{not json").unwrap();

        let fallback = Sample {
            name: "fallback".to_string(),
            count: -1,
        };
        let loaded: Sample = store.load("sample", fallback.clone());
        assert_eq!(loaded, fallback);
    }
}
