//! Entry/exit classification of ledger records.
//!
//! Both rule sets are pure functions of a record snapshot, the classifier
//! thresholds and the reference fetch date.

use chrono::NaiveDate;
use signal_core::{ClassifierConfig, SignalType, StandardizedRecord};
use tracing::{debug, info};

use crate::rules::{
    backtest_quality, earnings_momentum, exit_recency, price_band, signal_recency,
    trendpulse_direction, valuation, Rejection,
};

/// Result of classifying one ledger snapshot.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Open LONG signals inside the entry window.
    pub entries: Vec<StandardizedRecord>,
    /// Recently closed signals.
    pub exits: Vec<StandardizedRecord>,
}

/// Entry/exit rule engine.
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    config: ClassifierConfig,
}

impl SignalClassifier {
    /// Create a classifier with the given thresholds.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Check every entry gate, returning the first failure.
    pub fn check_entry(
        &self,
        record: &StandardizedRecord,
        fetch_date: NaiveDate,
    ) -> Result<(), Rejection> {
        if record.signal_type != SignalType::Long {
            return Err(Rejection::NotLong);
        }
        backtest_quality(record, &self.config)?;
        if !record.is_open() {
            return Err(Rejection::NotOpen);
        }
        price_band(record, &self.config)?;
        valuation(record, &self.config)?;
        earnings_momentum(record, &self.config)?;
        trendpulse_direction(record)?;
        signal_recency(record, fetch_date, self.config.entry_signal_recency_days)
    }

    /// Whether the record is a potential entry.
    pub fn entry_conditions(&self, record: &StandardizedRecord, fetch_date: NaiveDate) -> bool {
        self.check_entry(record, fetch_date).is_ok()
    }

    /// Check every exit gate, returning the first failure.
    ///
    /// Exits share the backtest, valuation, earnings and trendpulse gates with
    /// entries; direction and price band do not apply.
    pub fn check_exit(
        &self,
        record: &StandardizedRecord,
        fetch_date: NaiveDate,
    ) -> Result<(), Rejection> {
        backtest_quality(record, &self.config)?;
        if record.is_open() {
            return Err(Rejection::NotClosed);
        }
        exit_recency(record, fetch_date, self.config.exit_recency_days)?;
        valuation(record, &self.config)?;
        earnings_momentum(record, &self.config)?;
        trendpulse_direction(record)
    }

    /// Whether the record is a potential exit.
    pub fn exit_conditions(&self, record: &StandardizedRecord, fetch_date: NaiveDate) -> bool {
        self.check_exit(record, fetch_date).is_ok()
    }

    /// Records passing the entry rules, in input order.
    pub fn potential_entries(
        &self,
        records: &[StandardizedRecord],
        fetch_date: NaiveDate,
    ) -> Vec<StandardizedRecord> {
        self.filter(records, |r| self.check_entry(r, fetch_date), "entry")
    }

    /// Records passing the exit rules, in input order.
    pub fn potential_exits(
        &self,
        records: &[StandardizedRecord],
        fetch_date: NaiveDate,
    ) -> Vec<StandardizedRecord> {
        self.filter(records, |r| self.check_exit(r, fetch_date), "exit")
    }

    /// Run both rule sets over one snapshot.
    pub fn classify(
        &self,
        records: &[StandardizedRecord],
        fetch_date: NaiveDate,
    ) -> Classification {
        let classification = Classification {
            entries: self.potential_entries(records, fetch_date),
            exits: self.potential_exits(records, fetch_date),
        };
        info!(
            records = records.len(),
            entries = classification.entries.len(),
            exits = classification.exits.len(),
            %fetch_date,
            "Classified ledger snapshot"
        );
        classification
    }

    fn filter<F>(
        &self,
        records: &[StandardizedRecord],
        check: F,
        list: &str,
    ) -> Vec<StandardizedRecord>
    where
        F: Fn(&StandardizedRecord) -> Result<(), Rejection>,
    {
        records
            .iter()
            .filter(|record| match check(record) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(key = %record.dedup_key, list, %reason, "Rejected");
                    false
                }
            })
            .cloned()
            .collect()
    }
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::SignalFunction;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fetch() -> NaiveDate {
        date("2026-02-10")
    }

    /// Trendline record that passes every entry gate.
    fn make_entry_record() -> StandardizedRecord {
        let mut record = StandardizedRecord::new(SignalFunction::Trendline);
        record.symbol = Some("X".into());
        record.signal_type = SignalType::Long;
        record.signal_date = Some(date("2026-02-09"));
        record.win_rate = Some(92.3);
        record.number_of_trades = Some(13);
        record.signal_price = Some(100.0);
        record.today_price = Some(100.9);
        record.pe_ratio = Some(15.0);
        record.industry_pe = Some(20.0);
        record.last_quarter_profit = Some(120.0);
        record.last_year_same_quarter_profit = Some(200.0);
        record.trendpulse_start_price = Some(50.0);
        record.trendpulse_end_price = Some(40.0);
        record.exit_signal_raw = "No Exit Yet".into();
        record.refresh_dedup_key();
        record
    }

    fn make_exit_record() -> StandardizedRecord {
        let mut record = make_entry_record();
        record.exit_signal_raw = "2026-02-08 (Price: 104.0)".into();
        record.exit_date = Some(date("2026-02-08"));
        record.exit_price = Some(104.0);
        record
    }

    #[test]
    fn test_trendline_example_is_entry() {
        let classifier = SignalClassifier::default();
        assert_eq!(classifier.check_entry(&make_entry_record(), fetch()), Ok(()));
        assert!(classifier.entry_conditions(&make_entry_record(), fetch()));
    }

    #[test]
    fn test_entry_price_band_boundaries() {
        let classifier = SignalClassifier::default();
        let mut record = make_entry_record();

        record.today_price = Some(101.0);
        assert!(!classifier.entry_conditions(&record, fetch()));
        record.today_price = Some(97.0);
        assert!(!classifier.entry_conditions(&record, fetch()));
        record.today_price = Some(97.01);
        assert!(classifier.entry_conditions(&record, fetch()));
    }

    #[test]
    fn test_entry_rejects_short_and_closed() {
        let classifier = SignalClassifier::default();

        let mut short = make_entry_record();
        short.signal_type = SignalType::Short;
        assert_eq!(classifier.check_entry(&short, fetch()), Err(Rejection::NotLong));

        let closed = make_exit_record();
        assert_eq!(classifier.check_entry(&closed, fetch()), Err(Rejection::NotOpen));
    }

    #[test]
    fn test_missing_required_field_rejects_both_lists() {
        let classifier = SignalClassifier::default();
        let clears: [fn(&mut StandardizedRecord); 6] = [
            |r| r.win_rate = None,
            |r| r.number_of_trades = None,
            |r| r.pe_ratio = None,
            |r| r.industry_pe = None,
            |r| r.last_quarter_profit = None,
            |r| r.last_year_same_quarter_profit = None,
        ];

        for clear in clears {
            let mut entry = make_entry_record();
            clear(&mut entry);
            assert!(matches!(
                classifier.check_entry(&entry, fetch()),
                Err(Rejection::MissingField(_))
            ));

            let mut exit = make_exit_record();
            clear(&mut exit);
            assert!(matches!(
                classifier.check_exit(&exit, fetch()),
                Err(Rejection::MissingField(_))
            ));
        }
    }

    #[test]
    fn test_exit_conditions() {
        let classifier = SignalClassifier::default();
        assert_eq!(classifier.check_exit(&make_exit_record(), fetch()), Ok(()));

        // Exactly at the window edge.
        let mut edge = make_exit_record();
        edge.exit_date = Some(date("2026-02-07"));
        assert!(classifier.exit_conditions(&edge, fetch()));

        let mut stale = make_exit_record();
        stale.exit_date = Some(date("2026-02-06"));
        assert_eq!(classifier.check_exit(&stale, fetch()), Err(Rejection::StaleExit(4)));

        assert_eq!(
            classifier.check_exit(&make_entry_record(), fetch()),
            Err(Rejection::NotClosed)
        );
    }

    #[test]
    fn test_exit_ignores_price_band_and_direction() {
        let classifier = SignalClassifier::default();
        let mut record = make_exit_record();
        record.today_price = Some(150.0);
        record.signal_type = SignalType::Short;
        record.refresh_dedup_key();
        assert!(classifier.exit_conditions(&record, fetch()));
    }

    #[test]
    fn test_entry_signal_recency_gate() {
        let config = ClassifierConfig {
            entry_signal_recency_days: Some(0),
            ..ClassifierConfig::default()
        };
        let classifier = SignalClassifier::new(config);
        assert_eq!(
            classifier.check_entry(&make_entry_record(), fetch()),
            Err(Rejection::StaleSignal(1))
        );
        assert!(classifier.entry_conditions(&make_entry_record(), date("2026-02-09")));
    }

    #[test]
    fn test_classify_keeps_input_order() {
        let classifier = SignalClassifier::default();
        let mut second = make_entry_record();
        second.symbol = Some("Y".into());
        second.refresh_dedup_key();
        let mut rejected = make_entry_record();
        rejected.pe_ratio = Some(80.0);

        let records = vec![
            make_entry_record(),
            make_exit_record(),
            rejected,
            second,
        ];
        let result = classifier.classify(&records, fetch());

        let symbols: Vec<_> = result
            .entries
            .iter()
            .map(|r| r.symbol.clone().unwrap())
            .collect();
        assert_eq!(symbols, vec!["X", "Y"]);
        assert_eq!(result.exits.len(), 1);
    }
}
