use crate::TradeDate;

/// Days a security must trade before it stops being a recent IPO.
pub const MATURITY_THRESHOLD_DAYS: i64 = 365;

pub fn days_public(first_trade_date: TradeDate, today: TradeDate) -> i64 {
    today.days_since(first_trade_date)
}

pub fn is_mature(first_trade_date: TradeDate, today: TradeDate) -> bool {
    days_public(first_trade_date, today) > MATURITY_THRESHOLD_DAYS
}
