/// Name of the environment variable containing the path to the converter configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/pmt/convert.toml` or `$HOME/.config/pmt/convert.toml`
///  (2) on Windows: `%APPDATA%\pmt\convert.toml`
pub const ENV_CONFIG_PATH: &str = "PMT_CONFIG_PATH";

/// Directory holding the configuration file, below the platform config root.
pub const CONFIG_DIR_NAME: &str = "pmt";

pub const CONFIG_FILE_NAME: &str = "convert.toml";

/// Deepest nesting level a conversion walks before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 512;
