//! Trade-level summary statistics.

use super::position::Trade;

/// Summary of a simulator run, derived purely from its trade list.
///
/// Ratios are `None` when they have no defined value: every ratio on an empty
/// trade list, and `profit_factor` whenever the losing side sums to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub trades: Vec<Trade>,
    pub trade_count: usize,
    pub win_rate: Option<f64>,
    pub average_return_pct: Option<f64>,
    pub profit_factor: Option<f64>,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub largest_win: Option<f64>,
    pub largest_loss: Option<f64>,
    pub avg_holding_days: Option<f64>,
}

impl BacktestReport {
    pub fn from_trades(trades: Vec<Trade>) -> Self {
        let trade_count = trades.len();

        let mut trades_won = 0usize;
        let mut gross_gain = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win: Option<f64> = None;
        let mut largest_loss: Option<f64> = None;
        let mut total_return = 0.0_f64;
        let mut total_days = 0i64;

        for trade in &trades {
            let r = trade.return_pct;
            total_return += r;
            total_days += trade.holding_days();
            if r > 0.0 {
                trades_won += 1;
                gross_gain += r;
                largest_win = Some(largest_win.map_or(r, |w| w.max(r)));
            } else {
                gross_loss += r.abs();
                if r < 0.0 {
                    largest_loss = Some(largest_loss.map_or(r, |l| l.min(r)));
                }
            }
        }

        let (win_rate, average_return_pct, avg_holding_days) = if trade_count > 0 {
            let n = trade_count as f64;
            (
                Some(trades_won as f64 / n),
                Some(total_return / n),
                Some(total_days as f64 / n),
            )
        } else {
            (None, None, None)
        };

        let profit_factor = if trade_count > 0 && gross_loss > 0.0 {
            Some(gross_gain / gross_loss)
        } else {
            None
        };

        BacktestReport {
            trades,
            trade_count,
            win_rate,
            average_return_pct,
            profit_factor,
            trades_won,
            trades_lost: trade_count - trades_won,
            largest_win,
            largest_loss,
            avg_holding_days,
        }
    }

    /// Profit factor for display: `inf` when there are trades but no losses.
    pub fn profit_factor_display(&self) -> String {
        match (self.profit_factor, self.trade_count) {
            (Some(pf), _) => format!("{pf:.2}"),
            (None, 0) => "n/a".to_string(),
            (None, _) => "inf".to_string(),
        }
    }
}
