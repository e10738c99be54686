//! Server and room configuration.
//!
//! - `ServerConfig`: process-wide knobs (bind address, timer lengths, seed).
//!   Defaults match production; `from_env` overlays `OKEY_*` variables.
//! - `RoomSettings`: per-room knobs the host may change in the lobby.
//! - `GameMode`: which engine variant a room runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Engine variant played in a room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Race to a complete 14-tile hand.
    #[default]
    #[serde(rename = "classic")]
    Classic,
    /// Melds on the table, 101-point opening, penalty scores.
    #[serde(rename = "101")]
    HundredOne,
}

/// Whether a room shows up in `getRooms`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Host-editable room settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Seconds a seat has to act before auto-play.
    pub turn_seconds: u32,
    /// Ledger score at which the series is considered over.
    pub target_score: i32,
    pub visibility: Visibility,
}

impl RoomSettings {
    pub const MIN_TURN_SECONDS: u32 = 5;
    pub const MAX_TURN_SECONDS: u32 = 120;

    #[must_use]
    pub fn new(turn_seconds: u32) -> Self {
        Self {
            turn_seconds,
            target_score: 20,
            visibility: Visibility::Public,
        }
    }

    /// Apply a partial update. Either all fields apply or none do.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Result<(), LifecycleError> {
        if let Some(secs) = update.turn_seconds {
            if !(Self::MIN_TURN_SECONDS..=Self::MAX_TURN_SECONDS).contains(&secs) {
                return Err(LifecycleError::InvalidSetting(format!(
                    "turn duration must be {}-{} seconds",
                    Self::MIN_TURN_SECONDS,
                    Self::MAX_TURN_SECONDS
                )));
            }
        }
        if let Some(target) = update.target_score {
            if target <= 0 {
                return Err(LifecycleError::InvalidSetting(
                    "target score must be positive".into(),
                ));
            }
        }

        if let Some(secs) = update.turn_seconds {
            self.turn_seconds = secs;
        }
        if let Some(target) = update.target_score {
            self.target_score = target;
        }
        if let Some(visibility) = update.visibility {
            self.visibility = visibility;
        }
        Ok(())
    }
}

/// Partial settings sent with `updateSettings`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub turn_seconds: Option<u32>,
    #[serde(default)]
    pub target_score: Option<i32>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// A bad `OKEY_*` environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: String,
    pub value: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid value for {}: '{}'", self.key, self.value)
    }
}

impl std::error::Error for ConfigError {}

/// Process-wide configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the TCP binding listens on.
    pub bind_addr: String,

    /// Default per-turn countdown for new rooms, in seconds.
    pub turn_seconds: u32,

    /// How long a disconnected seat stays reserved.
    pub reconnect_grace_secs: u64,

    /// Bot "thinking" delay before it moves.
    pub bot_think_ms: u64,

    /// Countdown before a match launches, in seconds.
    pub start_countdown: u32,

    /// Pause between the last restart vote and the countdown.
    pub restart_delay_ms: u64,

    /// Seats per room.
    pub max_players: usize,

    /// Root RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Chat messages are cut to this many characters.
    pub max_chat_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            turn_seconds: 30,
            reconnect_grace_secs: 60,
            bot_think_ms: 1500,
            start_countdown: 3,
            restart_delay_ms: 1000,
            max_players: 4,
            seed: None,
            max_chat_len: 200,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `OKEY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Defaults overlaid with the given key/value pairs.
    ///
    /// Recognized keys: `OKEY_BIND`, `OKEY_TURN_SECONDS`,
    /// `OKEY_GRACE_SECONDS`, `OKEY_BOT_THINK_MS`, `OKEY_SEED`.
    pub fn from_vars(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError {
                key: key.to_string(),
                value: value.to_string(),
            })
        }

        let mut config = Self::default();
        for (key, value) in vars {
            match key.as_str() {
                "OKEY_BIND" => config.bind_addr = value,
                "OKEY_TURN_SECONDS" => config.turn_seconds = parse(&key, &value)?,
                "OKEY_GRACE_SECONDS" => config.reconnect_grace_secs = parse(&key, &value)?,
                "OKEY_BOT_THINK_MS" => config.bot_think_ms = parse(&key, &value)?,
                "OKEY_SEED" => config.seed = Some(parse(&key, &value)?),
                _ => {}
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_turn_seconds(mut self, secs: u32) -> Self {
        self.turn_seconds = secs;
        self
    }

    #[must_use]
    pub fn with_bot_think_ms(mut self, ms: u64) -> Self {
        self.bot_think_ms = ms;
        self
    }

    #[must_use]
    pub fn with_reconnect_grace_secs(mut self, secs: u64) -> Self {
        self.reconnect_grace_secs = secs;
        self
    }

    #[must_use]
    pub fn with_start_countdown(mut self, secs: u32) -> Self {
        self.start_countdown = secs;
        self
    }

    #[must_use]
    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_secs(self.reconnect_grace_secs)
    }

    #[must_use]
    pub fn bot_think(&self) -> Duration {
        Duration::from_millis(self.bot_think_ms)
    }

    #[must_use]
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Settings a freshly created room starts with.
    #[must_use]
    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings::new(self.turn_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.turn_seconds, 30);
        assert_eq!(config.reconnect_grace(), Duration::from_secs(60));
        assert_eq!(config.max_players, 4);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_from_vars_overlays() {
        let config = ServerConfig::from_vars(vars(&[
            ("OKEY_TURN_SECONDS", "15"),
            ("OKEY_SEED", "99"),
            ("OKEY_BIND", "127.0.0.1:9000"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();

        assert_eq!(config.turn_seconds, 15);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.bot_think_ms, 1500);
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = ServerConfig::from_vars(vars(&[("OKEY_GRACE_SECONDS", "soon")])).unwrap_err();
        assert_eq!(err.key, "OKEY_GRACE_SECONDS");
    }

    #[test]
    fn test_settings_apply_is_all_or_nothing() {
        let mut settings = RoomSettings::new(30);
        let update = SettingsUpdate {
            turn_seconds: Some(3),
            target_score: Some(50),
            visibility: Some(Visibility::Private),
        };

        assert!(settings.apply(&update).is_err());
        assert_eq!(settings, RoomSettings::new(30));

        let update = SettingsUpdate {
            turn_seconds: Some(45),
            ..SettingsUpdate::default()
        };
        settings.apply(&update).unwrap();
        assert_eq!(settings.turn_seconds, 45);
        assert_eq!(settings.visibility, Visibility::Public);
    }

    #[test]
    fn test_game_mode_wire_names() {
        assert_eq!(serde_json::to_string(&GameMode::HundredOne).unwrap(), "\"101\"");
        let mode: GameMode = serde_json::from_str("\"classic\"").unwrap();
        assert_eq!(mode, GameMode::Classic);
    }
}
