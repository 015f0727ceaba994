//! The tone catalog: the closed set of styles a rewrite can target.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A target style for a rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Strict,
    Persuasive,
}

/// Display metadata for a tone, as served to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToneDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// Returned when an identifier does not name a known tone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tone: {0}")]
pub struct UnknownTone(pub String);

const ALL: [Tone; 4] = [
    Tone::Professional,
    Tone::Friendly,
    Tone::Strict,
    Tone::Persuasive,
];

/// Older clients submit `Cold` for the strict tone.
const ALIASES: &[(&str, Tone)] = &[("cold", Tone::Strict)];

impl Tone {
    /// Every tone, in display order.
    pub fn all() -> &'static [Tone] {
        &ALL
    }

    /// Look up a tone by identifier. Case-insensitive, surrounding
    /// whitespace ignored.
    pub fn resolve(id: &str) -> Result<Tone, UnknownTone> {
        let needle = id.trim();
        ALL.iter()
            .copied()
            .find(|tone| tone.id().eq_ignore_ascii_case(needle))
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(needle))
                    .map(|(_, tone)| *tone)
            })
            .ok_or_else(|| UnknownTone(needle.to_string()))
    }

    pub fn id(self) -> &'static str {
        self.descriptor().id
    }

    pub fn descriptor(self) -> ToneDescriptor {
        match self {
            Tone::Professional => ToneDescriptor {
                id: "Professional",
                label: "Professional",
                description: "Corporate Standard",
            },
            Tone::Friendly => ToneDescriptor {
                id: "Friendly",
                label: "Friendly",
                description: "Warm & Casual",
            },
            Tone::Strict => ToneDescriptor {
                id: "Strict",
                label: "Strict",
                description: "Direct & Firm",
            },
            Tone::Persuasive => ToneDescriptor {
                id: "Persuasive",
                label: "Persuasive",
                description: "Sales & Impact",
            },
        }
    }

    /// One-line style guide handed to the engine.
    pub fn style_guide(self) -> &'static str {
        match self {
            Tone::Professional => {
                "Polished and courteous, suitable for a workplace email. Avoid slang."
            }
            Tone::Friendly => "Warm, relaxed and approachable, as if writing to a colleague you like.",
            Tone::Strict => "Direct and firm. Short sentences, no hedging, no pleasantries.",
            Tone::Persuasive => {
                "Confident and compelling. Emphasise benefits and end with a clear call to action."
            }
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::resolve(s)
    }
}
