//! Client configuration loading: server endpoint, room identifier policy, timers and the
//! challenge catalogue.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/lobby.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BATTLEGROUND_LOBBY_CONFIG_PATH";
/// Environment variable that overrides the configured server URL.
const SERVER_URL_ENV: &str = "BATTLEGROUND_SERVER_URL";
const DEFAULT_SERVER_URL: &str = "ws://localhost:5000/socket";
const DEFAULT_SEARCH_TICK: Duration = Duration::from_secs(1);

/// Shape of generated and accepted private room identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdPolicy {
    /// Fixed tag every generated identifier starts with.
    pub prefix: String,
    /// Number of random characters appended to the prefix.
    pub random_len: usize,
    /// Shortest identifier accepted in the join form.
    pub min_len: usize,
    /// Longest identifier accepted in the join form.
    pub max_len: usize,
}

impl Default for RoomIdPolicy {
    fn default() -> Self {
        Self {
            prefix: "SQL".into(),
            random_len: 6,
            min_len: 4,
            max_len: 16,
        }
    }
}

/// Exponential backoff bounds for reconnecting to the matchmaking server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for the doubling wait.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Challenge mode offered in the lobby with its default battle length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeType {
    /// Name shown in the lobby and sent as `challengeTypeLabel`.
    pub label: String,
    /// Default battle length.
    pub duration_seconds: u64,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration of the lobby client.
pub struct LobbyConfig {
    /// WebSocket URL of the matchmaking server.
    pub server_url: String,
    /// Room identifier policy.
    pub room_ids: RoomIdPolicy,
    /// Period of the search timer.
    pub search_tick: Duration,
    /// Reconnection backoff.
    pub reconnect: ReconnectPolicy,
    challenges: Vec<ChallengeType>,
}

impl LobbyConfig {
    /// Load the configuration from disk, falling back to built-in defaults, then apply the
    /// server URL override from the environment.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                Self::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(url) = env::var(SERVER_URL_ENV).ok().filter(|url| !url.is_empty()) {
            config.server_url = url;
        }

        info!(
            server_url = %config.server_url,
            challenges = config.challenges.len(),
            "lobby configuration ready"
        );
        config
    }

    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Known challenge modes.
    pub fn challenges(&self) -> &[ChallengeType] {
        &self.challenges
    }

    /// Default battle length of a challenge, matched case-insensitively on its label.
    pub fn challenge_duration(&self, label: &str) -> Option<u64> {
        self.challenges
            .iter()
            .find(|challenge| challenge.label.eq_ignore_ascii_case(label.trim()))
            .map(|challenge| challenge.duration_seconds)
    }
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            room_ids: RoomIdPolicy::default(),
            search_tick: DEFAULT_SEARCH_TICK,
            reconnect: ReconnectPolicy::default(),
            challenges: default_challenges(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    server_url: Option<String>,
    room_id_prefix: Option<String>,
    room_id_random_len: Option<usize>,
    room_id_min_len: Option<usize>,
    room_id_max_len: Option<usize>,
    search_tick_ms: Option<u64>,
    reconnect_initial_ms: Option<u64>,
    reconnect_max_ms: Option<u64>,
    challenges: Option<Vec<RawChallenge>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of a single challenge entry.
struct RawChallenge {
    label: String,
    duration_seconds: u64,
}

impl From<RawChallenge> for ChallengeType {
    fn from(value: RawChallenge) -> Self {
        Self {
            label: value.label,
            duration_seconds: value.duration_seconds,
        }
    }
}

impl From<RawConfig> for LobbyConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();

        let mut room_ids = RoomIdPolicy {
            prefix: value
                .room_id_prefix
                .map(|prefix| prefix.trim().to_ascii_uppercase())
                .unwrap_or(defaults.room_ids.prefix),
            random_len: value.room_id_random_len.unwrap_or(defaults.room_ids.random_len),
            min_len: value.room_id_min_len.unwrap_or(defaults.room_ids.min_len),
            max_len: value.room_id_max_len.unwrap_or(defaults.room_ids.max_len),
        };
        let generated_len = room_ids.prefix.len() + room_ids.random_len;
        let prefix_is_alphanumeric = room_ids.prefix.chars().all(|c| c.is_ascii_alphanumeric());
        if !prefix_is_alphanumeric
            || room_ids.random_len == 0
            || room_ids.min_len > room_ids.max_len
            || generated_len < room_ids.min_len
            || generated_len > room_ids.max_len
        {
            warn!(
                policy = ?room_ids,
                "generated room ids would fail join validation; using default room id policy"
            );
            room_ids = RoomIdPolicy::default();
        }

        let initial_delay = value
            .reconnect_initial_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect.initial_delay);
        let max_delay = value
            .reconnect_max_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect.max_delay)
            .max(initial_delay);

        Self {
            server_url: value.server_url.unwrap_or(defaults.server_url),
            room_ids,
            search_tick: value
                .search_tick_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_tick),
            reconnect: ReconnectPolicy {
                initial_delay,
                max_delay,
            },
            challenges: value
                .challenges
                .map(|challenges| challenges.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.challenges),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in challenge catalogue shipped with the binary.
fn default_challenges() -> Vec<ChallengeType> {
    vec![
        ChallengeType {
            label: "Bullet Surge".into(),
            duration_seconds: 600,
        },
        ChallengeType {
            label: "Rapid Fire".into(),
            duration_seconds: 300,
        },
        ChallengeType {
            label: "Endurance".into(),
            duration_seconds: 1_200,
        },
    ]
}
