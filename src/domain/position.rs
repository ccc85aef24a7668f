//! Open simulated position and the sealed trade it becomes.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    pub fn should_stop_loss(&self, price: f64) -> bool {
        price <= self.stop_loss
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        price >= self.take_profit
    }

    pub fn unrealized_return(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// Consume the position into an immutable trade record.
    pub fn close(self, exit_date: NaiveDate, exit_price: f64, reason: ExitReason) -> Trade {
        Trade {
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            return_pct: self.unrealized_return(exit_price),
            exit_reason: reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    EndOfData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    /// Fractional return, e.g. 0.10 for +10%.
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
