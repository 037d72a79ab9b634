use serde::Serialize;

use crate::TradeDate;

/// Fixed post-listing milestones, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    Pricing,
    QuietPeriod,
    LockUp,
}

impl DeadlineKind {
    pub const ALL: [Self; 3] = [Self::Pricing, Self::QuietPeriod, Self::LockUp];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pricing => "IPO Pricing / First Trade",
            Self::QuietPeriod => "Quiet Period (T+25)",
            Self::LockUp => "Lock-Up Expiry (T+180)",
        }
    }

    pub const fn offset_days(self) -> i64 {
        match self {
            Self::Pricing => 0,
            Self::QuietPeriod => 25,
            Self::LockUp => 180,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    Passed,
    Upcoming,
}

impl DeadlineStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Upcoming => "Upcoming",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deadline {
    pub kind: DeadlineKind,
    pub date: TradeDate,
    pub offset_days: i64,
}

impl Deadline {
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// A deadline falling on `today` is still upcoming.
    pub fn status(&self, today: TradeDate) -> DeadlineStatus {
        if self.date < today {
            DeadlineStatus::Passed
        } else {
            DeadlineStatus::Upcoming
        }
    }
}

pub fn derive_deadlines(first_trade_date: TradeDate) -> [Deadline; 3] {
    DeadlineKind::ALL.map(|kind| Deadline {
        kind,
        date: first_trade_date.plus_days(kind.offset_days()),
        offset_days: kind.offset_days(),
    })
}
