//! Moving-average backtest engine.
//!
//! Simulates a single-position strategy day by day: invest all cash when the
//! day's price drops below the buy moving average, liquidate everything when
//! it rises above the sell moving average, otherwise hold. Produces one
//! ledger entry per simulated day plus, when a position is still open at the
//! end, a synthetic terminal liquidation entry.

use chrono::NaiveDate;
use std::fmt;

use super::bar::PriceBar;
use super::error::StocklensError;
use super::moving_average::trailing_mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hold,
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hold => write!(f, "Hold"),
            Action::Buy => write!(f, "Buy"),
            Action::Sell => write!(f, "Sell"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestParams {
    pub initial_investment: f64,
    pub buy_window: usize,
    pub sell_window: usize,
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), StocklensError> {
        if !(self.initial_investment > 0.0) {
            return Err(StocklensError::invalid_parameter(
                "initial_investment",
                "must be positive",
            ));
        }
        if self.buy_window == 0 {
            return Err(StocklensError::invalid_parameter(
                "buy_window",
                "must be at least 1",
            ));
        }
        if self.sell_window == 0 {
            return Err(StocklensError::invalid_parameter(
                "sell_window",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// One row of the simulation ledger, reflecting state after the day's action.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub symbol: String,
    pub date: NaiveDate,
    pub action: Action,
    pub price: f64,
    pub cash: f64,
    pub stock_holdings: f64,
    pub total_value: f64,
    pub net_return: f64,
}

/// One bar reduced to the values the strategy looks at. The moving averages
/// stay `None` through their warmup and must not trigger trades.
#[derive(Debug, Clone)]
struct DerivedPricePoint {
    date: NaiveDate,
    price: f64,
    buy_ma: Option<f64>,
    sell_ma: Option<f64>,
}

fn derive_points(bars: &[PriceBar], buy_window: usize, sell_window: usize) -> Vec<DerivedPricePoint> {
    let prices: Vec<f64> = bars.iter().map(PriceBar::mid_price).collect();
    let buy_mas = trailing_mean(&prices, buy_window);
    let sell_mas = trailing_mean(&prices, sell_window);

    bars.iter()
        .zip(prices)
        .zip(buy_mas.into_iter().zip(sell_mas))
        .map(|((bar, price), (buy_ma, sell_ma))| DerivedPricePoint {
            date: bar.date,
            price,
            buy_ma,
            sell_ma,
        })
        .collect()
}

/// Run the moving-average strategy over `bars` (ascending by date).
///
/// Holds {cash, stock_holdings} through the walk, starting fully in cash.
/// Buy is checked before Sell. A series shorter than the longest window
/// never trades and yields an all-Hold ledger with final return 0.
///
/// If stock is still held after the last bar, a terminal Sell entry is
/// appended at the last price. Its `net_return` carries over the
/// pre-liquidation value rather than being recomputed from the liquidated
/// cash; the original system behaved this way and downstream consumers
/// expect it (see DESIGN.md).
pub fn simulate(
    symbol: &str,
    bars: &[PriceBar],
    params: &BacktestParams,
) -> Result<Vec<LedgerEntry>, StocklensError> {
    params.validate()?;

    let points = derive_points(bars, params.buy_window, params.sell_window);

    let mut cash = params.initial_investment;
    let mut stock_holdings = 0.0_f64;
    let mut total_value = params.initial_investment;

    let mut ledger: Vec<LedgerEntry> = Vec::with_capacity(points.len() + 1);

    for point in &points {
        let mut action = Action::Hold;

        if let (Some(buy_ma), Some(sell_ma)) = (point.buy_ma, point.sell_ma) {
            if point.price < buy_ma && cash > 0.0 {
                stock_holdings = cash / point.price;
                cash = 0.0;
                action = Action::Buy;
            } else if point.price > sell_ma && stock_holdings > 0.0 {
                cash = stock_holdings * point.price;
                stock_holdings = 0.0;
                action = Action::Sell;
            }
        }

        total_value = cash + stock_holdings * point.price;

        ledger.push(LedgerEntry {
            symbol: symbol.to_string(),
            date: point.date,
            action,
            price: point.price,
            cash,
            stock_holdings,
            total_value,
            net_return: total_value - params.initial_investment,
        });
    }

    // Forced liquidation of any open position at the last day's price. The
    // carried-over net_return is intentional; do not recompute it here.
    if stock_holdings > 0.0 {
        if let Some(last) = points.last() {
            cash = stock_holdings * last.price;

            ledger.push(LedgerEntry {
                symbol: symbol.to_string(),
                date: last.date,
                action: Action::Sell,
                price: last.price,
                cash,
                stock_holdings: 0.0,
                total_value: cash,
                net_return: total_value - params.initial_investment,
            });
        }
    }

    Ok(ledger)
}
