// Machine configuration. Kept free of `serde` unless the caller opts into
// the `serde` feature, mirroring how this pool's better-appointed
// workspaces (the QuantumOS portal crates, the emu198x machine crates) push
// serialization to their outer/binary crates and keep inner "core" crates
// free of it.

use crate::dsky::DskyMode;

#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub initial_fb: u8,
    pub initial_eb: u8,
    pub dsky_mode: DskyModeConfig,
}

/// Serde-friendly mirror of `DskyMode` (kept separate so `dsky::DskyMode`
/// doesn't need to carry a `serde` derive of its own).
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DskyModeConfig {
    Dec,
    Oct,
}

impl From<DskyModeConfig> for DskyMode {
    fn from(value: DskyModeConfig) -> Self {
        match value {
            DskyModeConfig::Dec => DskyMode::Dec,
            DskyModeConfig::Oct => DskyMode::Oct,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { initial_fb: 0, initial_eb: 0, dsky_mode: DskyModeConfig::Dec }
    }
}
