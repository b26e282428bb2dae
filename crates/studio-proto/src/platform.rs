use std::path::PathBuf;

const APP_DIR: &str = "studio-grabber";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/studio-grabber/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(temp_dir)
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Where `config.toml` lives: `$XDG_CONFIG_HOME/studio-grabber` on Linux,
/// the platform config dir elsewhere.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(temp_dir)
        .join(APP_DIR)
}

/// Base directory for grabbed audio files.
pub fn music_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}
