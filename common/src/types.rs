use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp layout shared by the status line and the `datetime` column.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    LeaveOn,
    LeaveOff,
    Activate,
    Deactivate,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeaveOn => "leave on",
            Self::LeaveOff => "leave off",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        }
    }

    /// Operator-facing verdict printed at the end of a status line.
    pub fn verdict(self) -> &'static str {
        match self {
            Self::LeaveOn => "leave on",
            Self::LeaveOff => "leave off",
            Self::Activate => "** TURN ON **",
            Self::Deactivate => "** TURN OFF **",
        }
    }

    pub fn requires_switching(self) -> bool {
        matches!(self, Self::Activate | Self::Deactivate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunMode {
    Continuous,
    SingleShot { max_attempts: u32 },
}

impl RunMode {
    /// Maps the CLI convention: `0` runs continuously, anything else is a single shot.
    pub fn from_max_attempts(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            Self::Continuous
        } else {
            Self::SingleShot { max_attempts }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "cont",
            Self::SingleShot { .. } => "single",
        }
    }

    pub fn max_attempts(self) -> Option<u32> {
        match self {
            Self::Continuous => None,
            Self::SingleShot { max_attempts } => Some(max_attempts),
        }
    }

    pub fn is_single_shot(self) -> bool {
        matches!(self, Self::SingleShot { .. })
    }
}

/// One completed read-decide-act cycle, as persisted by the run log.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub timestamp: DateTime<Local>,
    pub mode: RunMode,
    pub panel_output: f64,
    pub state_before: bool,
    pub action: Action,
    pub state_after: bool,
}

impl CycleRecord {
    pub const HEADER: [&'static str; 7] = [
        "datetime",
        "mode",
        "panel_success",
        "panel_output",
        "socket_state",
        "action",
        "socket_state_after",
    ];

    /// Only successful reads produce a record, so `panel_success` is always true.
    pub fn panel_success(&self) -> bool {
        true
    }

    pub fn to_row(&self) -> [String; 7] {
        [
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.mode.as_str().to_string(),
            bool_field(self.panel_success()).to_string(),
            self.panel_output.to_string(),
            bool_field(self.state_before).to_string(),
            self.action.as_str().to_string(),
            bool_field(self.state_after).to_string(),
        ]
    }
}

// Existing logs were written with capitalised booleans; downstream sheets key on them.
fn bool_field(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn zero_attempts_means_continuous() {
        assert_eq!(RunMode::from_max_attempts(0), RunMode::Continuous);
        assert_eq!(
            RunMode::from_max_attempts(3),
            RunMode::SingleShot { max_attempts: 3 }
        );
        assert_eq!(RunMode::from_max_attempts(3).max_attempts(), Some(3));
    }

    #[test]
    fn record_row_follows_header_order() {
        let record = CycleRecord {
            timestamp: Local.with_ymd_and_hms(2024, 6, 1, 12, 30, 5).unwrap(),
            mode: RunMode::Continuous,
            panel_output: 0.8,
            state_before: false,
            action: Action::Activate,
            state_after: true,
        };

        assert_eq!(
            record.to_row(),
            [
                "01/06/24 12:30:05".to_string(),
                "cont".to_string(),
                "True".to_string(),
                "0.8".to_string(),
                "False".to_string(),
                "activate".to_string(),
                "True".to_string(),
            ]
        );
    }

    #[test]
    fn only_switching_actions_touch_the_device() {
        assert!(Action::Activate.requires_switching());
        assert!(Action::Deactivate.requires_switching());
        assert!(!Action::LeaveOn.requires_switching());
        assert!(!Action::LeaveOff.requires_switching());
    }
}
