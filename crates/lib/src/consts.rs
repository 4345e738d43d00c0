pub const APP_NAME: &str = "buildbox";

/// Config file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Source file every workspace builds.
pub const SOURCE_FILENAME: &str = "main.go";

/// Module descriptor file every workspace carries.
pub const MODULE_FILENAME: &str = "go.mod";
