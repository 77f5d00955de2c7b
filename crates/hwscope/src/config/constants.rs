pub(super) const CONFIG_ENV: &str = "HWSCOPE_CONFIG";

#[cfg(target_os = "windows")]
pub(super) const CONFIG_CANDIDATES: [&str; 2] = [
    r".\hwscope.toml",
    r"C:\ProgramData\hwscope\hwscope.toml",
];

#[cfg(not(target_os = "windows"))]
pub(super) const CONFIG_CANDIDATES: [&str; 1] = ["./hwscope.toml"];

pub(super) const DEFAULT_LOG_LEVEL: &str = "warn";
