use crate::error::{GridwatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grid load level reported by the remote service.
///
/// The variants are labels only; no ordering between them is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridState {
    SuperGreen,
    Green,
    Yellow,
    Red,
}

impl GridState {
    pub const ALL: [Self; 4] = [Self::SuperGreen, Self::Green, Self::Yellow, Self::Red];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperGreen => "superGreen",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridState {
    type Err = GridwatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                GridwatchError::validation("status", format!("Unknown grid status '{}'", s))
            })
    }
}

/// Map a remote state code onto a [`GridState`].
///
/// Unknown codes are an error: they mean the API contract changed.
pub fn map_state(code: i64) -> Result<GridState> {
    match code {
        -1 => Ok(GridState::SuperGreen),
        1 => Ok(GridState::Green),
        3 => Ok(GridState::Yellow),
        4 => Ok(GridState::Red),
        other => Err(GridwatchError::unknown_state(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_exactly() {
        assert_eq!(map_state(-1).unwrap(), GridState::SuperGreen);
        assert_eq!(map_state(1).unwrap(), GridState::Green);
        assert_eq!(map_state(3).unwrap(), GridState::Yellow);
        assert_eq!(map_state(4).unwrap(), GridState::Red);
    }

    #[test]
    fn unknown_codes_fail() {
        for code in [-2, 0, 2, 5, 999, i64::MIN, i64::MAX] {
            let err = map_state(code).unwrap_err();
            assert!(matches!(err, GridwatchError::UnknownState { code: c } if c == code));
        }
        assert_eq!(map_state(999).unwrap_err().to_string(), "Unknown state: 999");
    }

    #[test]
    fn labels_parse_and_serialize() {
        assert_eq!("superGreen".parse::<GridState>().unwrap(), GridState::SuperGreen);
        assert_eq!("RED".parse::<GridState>().unwrap(), GridState::Red);
        assert!("orange".parse::<GridState>().is_err());
        assert_eq!(
            serde_json::to_string(&GridState::SuperGreen).unwrap(),
            "\"superGreen\""
        );
    }
}
