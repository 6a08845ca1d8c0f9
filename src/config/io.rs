use std::env::current_exe;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use directories_next::ProjectDirs;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use serde_json;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::OpenOptions;
use std::str;
use log::{debug, info, warn};

use crate::config::types::Config;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "dexradio-remote.json";

// a dexradio-remote.json next to the executable wins over the per-user config, so the remote can
// run from a usb stick
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(path) => path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)),
        Err(err) => {
            warn!("Failed to get current exe path: {:?}", err);
            None
        },
    }
}

// %AppData%\dexaudio\dexradio-remote\config on windows, ~/.config/dexradio-remote on linux
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "dexaudio", "dexradio-remote").map(|dirs| {
        dirs.config_dir().join(CONFIG_FILE_NAME)
    })
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        match std::fs::metadata(&path) {
            Ok(attr) if attr.is_file() => return Ok(path),
            Ok(_) => {},
            Err(err) => {
                debug!("No portable config at {} ({:?})", path.to_string_lossy(), err.kind());
            },
        }
    }

    get_local_config_path().ok_or(ConfigError::NoConfigPath)
}

pub struct ConfigIOLocker {
    rw_lock: RwLock<std::fs::File>,
}

impl ConfigIOLocker {
    /// Only one remote may own the config (and the radio link) at a time.
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<std::fs::File>, ConfigError> {
        self.rw_lock.try_write().map_err(|source| ConfigError::CanNotLock { source })
    }
}

struct ConfigIOInner {
    file: std::fs::File,
}

#[derive(Clone)]
pub struct ConfigIO {
    inner: Arc<Mutex<ConfigIOInner>>,
}

impl ConfigIO {
    pub fn new_sync() -> Result<Self, ConfigError> {
        let path = get_config_path()?;
        Self::open_sync(path)
    }

    pub fn open_sync(path: PathBuf) -> Result<Self, ConfigError> {
        info!("Using config file {}", path.to_string_lossy());

        if let Some(directory) = path.parent() {
            std::fs::create_dir_all(directory)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .append(false)
            .create(true)
            .open(&path)?;

        let inner = ConfigIOInner { file };
        Ok(ConfigIO { inner: Arc::new(Mutex::new(inner)) })
    }

    pub fn locker(&mut self) -> Result<ConfigIOLocker, ConfigError> {
        let inner = self.inner.lock().expect("Failed to lock ConfigIO inner");

        Ok(ConfigIOLocker {
            rw_lock: RwLock::new(inner.file.try_clone()?),
        })
    }

    // The File returned from here should never be closed!
    fn get_file(&self) -> Result<File, ConfigError> {
        let inner = self.inner.lock().expect("Failed to lock ConfigIO inner");
        let file = inner.file.try_clone()?;
        Ok(File::from_std(file))
    }

    pub async fn read(&self) -> Result<Config, ConfigError> {
        let mut file = self.get_file()?;
        debug!("Reading config file");

        let mut content = vec![];
        file.rewind().await?;
        file.read_to_end(&mut content).await?;

        if content.iter().all(|byte| byte.is_ascii_whitespace()) {
            return Ok(Config::default());
        }

        let content = str::from_utf8(&content)?;

        let mut config: Config = serde_json::from_str(content)?;
        config.sanitize();
        Ok(config)
    }

    pub async fn save(&self, config: Config) -> Result<(), ConfigError> {
        let mut file = self.get_file()?;
        debug!("Saving config");

        let content = serde_json::to_string_pretty(&config)?;
        file.rewind().await?;
        file.set_len(0).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("dexradio-remote-test-{}-{}", name, std::process::id()))
            .join(CONFIG_FILE_NAME)
    }

    #[tokio::test]
    async fn test_empty_file_reads_defaults() {
        let path = temp_config_path("empty");
        let config_io = ConfigIO::open_sync(path.clone()).unwrap();
        assert_eq!(config_io.read().await.unwrap(), Config::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let path = temp_config_path("save");
        let config_io = ConfigIO::open_sync(path.clone()).unwrap();

        let config = Config {
            device_name: "Attic".to_string(),
            buffer_size: Some(4096),
            ..Config::default()
        };
        config_io.save(config.clone()).await.unwrap();
        // a shorter document must not leave trailing bytes of the previous one
        config_io.save(Config { buffer_size: None, ..config.clone() }).await.unwrap();

        let read = config_io.read().await.unwrap();
        assert_eq!(read.device_name, "Attic");
        assert_eq!(read.buffer_size, None);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_second_lock_fails() {
        let path = temp_config_path("lock");
        let mut first = ConfigIO::open_sync(path.clone()).unwrap();
        let mut second = ConfigIO::open_sync(path.clone()).unwrap();

        let mut first_locker = first.locker().unwrap();
        let _guard = first_locker.lock().unwrap();

        let mut second_locker = second.locker().unwrap();
        assert!(matches!(second_locker.lock(), Err(ConfigError::CanNotLock { .. })));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
