//! Closed enums shared across the package model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A name that does not match any variant of a closed enum.
#[derive(Debug, Error)]
#[error("unknown {what}: {value:?}")]
pub struct UnknownName {
    what: &'static str,
    value: String,
}

/// Media players confpack can deploy configuration for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// mpv media player.
    Mpv,
    /// VLC media player.
    Vlc,
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mpv => write!(f, "mpv"),
            Self::Vlc => write!(f, "vlc"),
        }
    }
}

impl FromStr for PlayerKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mpv" => Ok(Self::Mpv),
            "vlc" => Ok(Self::Vlc),
            other => Err(UnknownName {
                what: "player",
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration profile a package is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Performance,
    Quality,
    Cinematic,
    Default,
}

impl ProfileKind {
    /// All profiles, in declaration order.
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::Performance,
        ProfileKind::Quality,
        ProfileKind::Cinematic,
        ProfileKind::Default,
    ];
}

impl Default for ProfileKind {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Performance => write!(f, "performance"),
            Self::Quality => write!(f, "quality"),
            Self::Cinematic => write!(f, "cinematic"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl FromStr for ProfileKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "performance" => Ok(Self::Performance),
            "quality" => Ok(Self::Quality),
            "cinematic" => Ok(Self::Cinematic),
            "default" => Ok(Self::Default),
            other => Err(UnknownName {
                what: "profile",
                value: other.to_string(),
            }),
        }
    }
}

/// Kinds of files a package may declare.
///
/// Each kind is dispatched to its own checker during validation
/// (see [`crate::validate::Validator`]). Adding a kind means adding a
/// variant here and an entry in the checker table, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Player configuration file (`key=value` syntax).
    Config,
    /// Lua plugin script.
    PluginLua,
    /// JavaScript plugin script.
    PluginJs,
    /// GPU shader source.
    Shader,
    /// Per-script option file (`key=value` syntax).
    ScriptOpt,
}

impl FileKind {
    /// All kinds, in declaration order.
    pub const ALL: [FileKind; 5] = [
        FileKind::Config,
        FileKind::PluginLua,
        FileKind::PluginJs,
        FileKind::Shader,
        FileKind::ScriptOpt,
    ];
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::PluginLua => write!(f, "plugin_lua"),
            Self::PluginJs => write!(f, "plugin_js"),
            Self::Shader => write!(f, "shader"),
            Self::ScriptOpt => write!(f, "script_opt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_kind_display() {
        assert_eq!(PlayerKind::Mpv.to_string(), "mpv");
        assert_eq!(PlayerKind::Vlc.to_string(), "vlc");
    }

    #[test]
    fn test_player_kind_serde_round_trip() {
        let json = serde_json::to_string(&PlayerKind::Mpv).unwrap();
        assert_eq!(json, "\"mpv\"");

        let back: PlayerKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PlayerKind::Mpv);
    }

    #[test]
    fn test_profile_kind_default() {
        assert_eq!(ProfileKind::default(), ProfileKind::Default);
    }

    #[test]
    fn test_file_kind_serde_names() {
        let json = serde_json::to_string(&FileKind::PluginLua).unwrap();
        assert_eq!(json, "\"plugin_lua\"");

        let kind: FileKind = serde_json::from_str("\"script_opt\"").unwrap();
        assert_eq!(kind, FileKind::ScriptOpt);
    }

    #[test]
    fn test_kind_names_parse_back() {
        assert_eq!("vlc".parse::<PlayerKind>().unwrap(), PlayerKind::Vlc);
        assert!("winamp".parse::<PlayerKind>().is_err());

        for profile in ProfileKind::ALL {
            assert_eq!(profile.to_string().parse::<ProfileKind>().unwrap(), profile);
        }
        assert!("ultra".parse::<ProfileKind>().is_err());
    }

    #[test]
    fn test_file_kind_all_is_exhaustive() {
        assert_eq!(FileKind::ALL.len(), 5);
        for kind in FileKind::ALL {
            // Display and serde names must agree.
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json.trim_matches('"'), kind.to_string());
        }
    }
}
