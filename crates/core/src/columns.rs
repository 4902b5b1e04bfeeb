//! Column names of the source tables and the persisted artifacts.
//!
//! Source column names are the literal headers of the Distance and
//! Trendline exports and must match byte for byte.

/// `"<symbol>, <signal-word>, <YYYY-MM-DD> (Price: <float>)"`
pub const SRC_SIGNAL: &str = "Symbol, Signal, Signal Date/Price[$]";
/// `"<pct>%, <history>, <int>"`
pub const SRC_WIN_RATE: &str = "Win Rate [%], History Tested, Number of Trades";
/// `"<YYYY-MM-DD> (Price: <float>), <pct>% above|below"`
pub const SRC_TODAY_VS_SIGNAL: &str = "Today Trading Date/Price[$], Today price vs Signal";
/// `"<interval>, <confirmation>"`
pub const SRC_INTERVAL: &str = "Interval, Confirmation Status";
/// `"<date> (Price: <float>)/<date> (Price: <float>)"`
pub const SRC_TRENDPULSE: &str = "TrendPulse Start/End (Date and Price($))";
/// `"No Exit Yet"` or `"<YYYY-MM-DD> (Price: <float>)"`
pub const SRC_EXIT_SIGNAL: &str = "Exit Signal Date/Price[$]";
pub const SRC_STRATEGY_CAGR: &str = "Backtested Strategy CAGR [%]";
pub const SRC_STRATEGY_SHARPE: &str = "Backtested Strategy Sharpe Ratio";

pub const SYMBOL: &str = "Symbol";
pub const SIGNAL_TYPE: &str = "Signal_Type";
pub const SIGNAL_DATE: &str = "Signal_Date";
pub const SIGNAL_PRICE: &str = "Signal_Price";
pub const WIN_RATE: &str = "Win_Rate";
pub const NUMBER_OF_TRADES: &str = "Number_Of_Trades";
pub const WIN_RATE_DISPLAY: &str = "Win_Rate_Display";
pub const TODAY_PRICE: &str = "Today_Price";
pub const TODAY_VS_SIGNAL_PCT: &str = "Today_vs_Signal_Pct";
pub const TODAY_VS_SIGNAL_PCT_SIGNED: &str = "Today_vs_Signal_Pct_Signed";
pub const EXIT_SIGNAL_RAW: &str = "Exit_Signal_Raw";
pub const FUNCTION: &str = "Function";
pub const INTERVAL: &str = "Interval";
pub const PE_RATIO: &str = "PE_Ratio";
pub const INDUSTRY_PE: &str = "Industry_PE";
pub const LAST_QUARTER_PROFIT: &str = "Last_Quarter_Profit";
pub const LAST_YEAR_SAME_QUARTER_PROFIT: &str = "Last_Year_Same_Quarter_Profit";
pub const STRATEGY_CAGR: &str = "Strategy_CAGR";
pub const STRATEGY_SHARPE: &str = "Strategy_Sharpe";
pub const TRENDPULSE_START_END: &str = "TrendPulse_Start_End";
pub const TRENDPULSE_START_PRICE: &str = "TrendPulse_Start_Price";
pub const TRENDPULSE_END_PRICE: &str = "TrendPulse_End_Price";
pub const EXIT_DATE: &str = "Exit_Date";
pub const EXIT_PRICE: &str = "Exit_Price";
pub const DEDUP_KEY: &str = "Dedup_Key";

/// Columns of the potential entry/exit tables, in output order.
pub const CURATED_COLUMNS: [&str; 23] = [
    SYMBOL,
    SIGNAL_TYPE,
    SIGNAL_DATE,
    SIGNAL_PRICE,
    WIN_RATE,
    NUMBER_OF_TRADES,
    WIN_RATE_DISPLAY,
    TODAY_PRICE,
    EXIT_SIGNAL_RAW,
    FUNCTION,
    INTERVAL,
    PE_RATIO,
    INDUSTRY_PE,
    LAST_QUARTER_PROFIT,
    LAST_YEAR_SAME_QUARTER_PROFIT,
    STRATEGY_CAGR,
    STRATEGY_SHARPE,
    TRENDPULSE_START_END,
    TRENDPULSE_START_PRICE,
    TRENDPULSE_END_PRICE,
    EXIT_DATE,
    EXIT_PRICE,
    DEDUP_KEY,
];

/// Standardized columns of the master ledger, in output order.
///
/// Passthrough source columns follow these in the persisted ledger.
pub const LEDGER_COLUMNS: [&str; 25] = [
    SYMBOL,
    SIGNAL_TYPE,
    SIGNAL_DATE,
    SIGNAL_PRICE,
    WIN_RATE,
    NUMBER_OF_TRADES,
    WIN_RATE_DISPLAY,
    TODAY_PRICE,
    TODAY_VS_SIGNAL_PCT,
    TODAY_VS_SIGNAL_PCT_SIGNED,
    EXIT_SIGNAL_RAW,
    FUNCTION,
    INTERVAL,
    PE_RATIO,
    INDUSTRY_PE,
    LAST_QUARTER_PROFIT,
    LAST_YEAR_SAME_QUARTER_PROFIT,
    STRATEGY_CAGR,
    STRATEGY_SHARPE,
    TRENDPULSE_START_END,
    TRENDPULSE_START_PRICE,
    TRENDPULSE_END_PRICE,
    EXIT_DATE,
    EXIT_PRICE,
    DEDUP_KEY,
];

/// Whether a column is one of the standardized ledger columns.
pub fn is_standard_column(name: &str) -> bool {
    LEDGER_COLUMNS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_is_subset_of_ledger() {
        for col in CURATED_COLUMNS {
            assert!(is_standard_column(col), "{col} missing from ledger columns");
        }
    }

    #[test]
    fn test_source_columns_are_not_standard() {
        assert!(!is_standard_column(SRC_SIGNAL));
        assert!(!is_standard_column(SRC_EXIT_SIGNAL));
    }
}
