//! The closed universe of dialects the lexicon keeps separate pronunciations for.
//!
//! A dialect is a region (east, south-west, west, trøndersk, north) combined with
//! a register (spoken, written). Its identifier doubles as the name of the
//! per-dialect snapshot table, which is why only members of this enum may ever
//! be interpolated into statement text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    ESpoken,
    EWritten,
    SwSpoken,
    SwWritten,
    WSpoken,
    WWritten,
    TSpoken,
    TWritten,
    NSpoken,
    NWritten,
}

impl Dialect {
    pub const ALL: [Dialect; 10] = [
        Dialect::ESpoken,
        Dialect::EWritten,
        Dialect::SwSpoken,
        Dialect::SwWritten,
        Dialect::WSpoken,
        Dialect::WWritten,
        Dialect::TSpoken,
        Dialect::TWritten,
        Dialect::NSpoken,
        Dialect::NWritten,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::ESpoken => "e_spoken",
            Dialect::EWritten => "e_written",
            Dialect::SwSpoken => "sw_spoken",
            Dialect::SwWritten => "sw_written",
            Dialect::WSpoken => "w_spoken",
            Dialect::WWritten => "w_written",
            Dialect::TSpoken => "t_spoken",
            Dialect::TWritten => "t_written",
            Dialect::NSpoken => "n_spoken",
            Dialect::NWritten => "n_written",
        }
    }

    /// Resolves a list of dialect names, dropping (and logging) names outside
    /// the universe as well as repeated ones. First-seen order is kept.
    pub fn parse_list<I, S>(names: I) -> Vec<Dialect>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dialects = Vec::new();
        for name in names {
            match name.as_ref().parse::<Dialect>() {
                Ok(dialect) => {
                    if !dialects.contains(&dialect) {
                        dialects.push(dialect);
                    }
                }
                Err(_) => warn!(dialect = name.as_ref(), "ignoring unknown dialect"),
            }
        }
        dialects
    }
}

impl FromStr for Dialect {
    type Err = LexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .iter()
            .find(|dialect| dialect.as_str() == s)
            .copied()
            .ok_or_else(|| LexError::UnknownDialect(s.to_string()))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
