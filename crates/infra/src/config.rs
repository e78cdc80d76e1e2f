//! Store configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use varistore_products::{DEFAULT_PRICE_DECIMALS, TaxDisplay, TaxRate, TaxSettings};

use crate::error::StoreError;

const THIRTY_DAYS_SECS: u64 = 30 * 24 * 60 * 60;
/// Largest span `chrono::Duration` holds in whole seconds.
const MAX_TTL_SECS: i64 = i64::MAX / 1_000;

/// Options read by the variable product data store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Restrict visible children (and the weight/dimensions probes) to
    /// in-stock variations.
    pub hide_out_of_stock_items: bool,
    pub tax_display_shop: TaxDisplay,
    pub prices_include_tax: bool,
    pub price_decimals: u32,
    pub tax_rates: Vec<TaxRate>,
    pub children_ttl_secs: u64,
    pub prices_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            hide_out_of_stock_items: false,
            tax_display_shop: TaxDisplay::Excl,
            prices_include_tax: false,
            price_decimals: DEFAULT_PRICE_DECIMALS,
            tax_rates: Vec::new(),
            children_ttl_secs: THIRTY_DAYS_SECS,
            prices_ttl_secs: THIRTY_DAYS_SECS,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `VARISTORE_*` environment variables.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("VARISTORE_HIDE_OUT_OF_STOCK") {
            config.hide_out_of_stock_items = parse_flag("VARISTORE_HIDE_OUT_OF_STOCK", raw.as_str())?;
        }
        if let Some(raw) = lookup("VARISTORE_TAX_DISPLAY_SHOP") {
            config.tax_display_shop = raw
                .parse()
                .map_err(|e| StoreError::config(format!("VARISTORE_TAX_DISPLAY_SHOP: {e}")))?;
        }
        if let Some(raw) = lookup("VARISTORE_PRICES_INCLUDE_TAX") {
            config.prices_include_tax = parse_flag("VARISTORE_PRICES_INCLUDE_TAX", &raw)?;
        }
        if let Some(raw) = lookup("VARISTORE_PRICE_DECIMALS") {
            config.price_decimals = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|d| *d <= 28)
                .ok_or_else(|| StoreError::config(format!("VARISTORE_PRICE_DECIMALS: invalid value '{raw}'")))?;
        }
        if let Some(raw) = lookup("VARISTORE_TAX_RATES") {
            config.tax_rates = serde_json::from_str(&raw)
                .map_err(|e| StoreError::config(format!("VARISTORE_TAX_RATES: {e}")))?;
        }

        Ok(config)
    }

    pub fn tax_settings(&self) -> TaxSettings {
        TaxSettings {
            prices_include_tax: self.prices_include_tax,
            tax_display_shop: self.tax_display_shop,
            rates: self.tax_rates.clone(),
            price_decimals: self.price_decimals,
        }
    }

    pub fn children_ttl(&self) -> Duration {
        secs(self.children_ttl_secs)
    }

    pub fn prices_ttl(&self) -> Duration {
        secs(self.prices_ttl_secs)
    }
}

/// Longer TTLs are clamped rather than rejected.
fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(MAX_TTL_SECS).min(MAX_TTL_SECS))
}

/// Accepts `yes`/`no` as stored by shop settings, plus the usual booleans.
fn parse_flag(name: &str, raw: &str) -> Result<bool, StoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Ok(true),
        "no" | "false" | "0" | "off" | "" => Ok(false),
        other => Err(StoreError::config(format!("{name}: expected yes or no, got '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn oversized_ttls_are_clamped() {
        let config: StoreConfig = serde_json::from_str(r#"{"prices_ttl_secs": 18446744073709551615}"#).unwrap();
        assert_eq!(config.prices_ttl(), Duration::seconds(MAX_TTL_SECS));
        assert_eq!(config.children_ttl(), Duration::days(30));
    }

    #[test]
    fn defaults_without_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.prices_ttl(), Duration::days(30));
        assert_eq!(config.children_ttl(), Duration::days(30));
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("VARISTORE_HIDE_OUT_OF_STOCK", "yes"),
            ("VARISTORE_TAX_DISPLAY_SHOP", "incl"),
            ("VARISTORE_PRICES_INCLUDE_TAX", "false"),
            ("VARISTORE_PRICE_DECIMALS", "3"),
            (
                "VARISTORE_TAX_RATES",
                r#"[{"id":1,"label":"VAT","rate":"20","compound":false,"priority":1}]"#,
            ),
        ]))
        .unwrap();

        assert!(config.hide_out_of_stock_items);
        assert_eq!(config.tax_display_shop, TaxDisplay::Incl);
        assert_eq!(config.price_decimals, 3);
        assert_eq!(config.tax_rates.len(), 1);

        let tax = config.tax_settings();
        assert_eq!(tax.price_decimals, 3);
        assert_eq!(tax.rates[0].label, "VAT");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for (name, value) in [
            ("VARISTORE_HIDE_OUT_OF_STOCK", "maybe"),
            ("VARISTORE_TAX_DISPLAY_SHOP", "gross"),
            ("VARISTORE_PRICE_DECIMALS", "-1"),
            ("VARISTORE_TAX_RATES", "{"),
        ] {
            let err = StoreConfig::from_lookup(lookup(&[(name, value)])).unwrap_err();
            assert!(matches!(err, StoreError::Config(msg) if msg.starts_with(name)));
        }
    }

    #[test]
    fn partial_json_config_uses_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"hide_out_of_stock_items":true}"#).unwrap();
        assert!(config.hide_out_of_stock_items);
        assert_eq!(config.price_decimals, DEFAULT_PRICE_DECIMALS);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: flag spellings are accepted whatever their case and padding.
            #[test]
            fn flags_ignore_case_and_whitespace(
                (word, expected) in prop_oneof![
                    Just(("yes", true)), Just(("true", true)), Just(("on", true)), Just(("1", true)),
                    Just(("no", false)), Just(("false", false)), Just(("off", false)), Just(("0", false)),
                ],
                upper in any::<bool>(),
                pad in "[ \t]{0,3}"
            ) {
                let raw = if upper { word.to_ascii_uppercase() } else { word.to_string() };
                let raw = format!("{pad}{raw}{pad}");
                let config = StoreConfig::from_lookup(lookup(&[("VARISTORE_HIDE_OUT_OF_STOCK", raw.as_str())])).unwrap();
                prop_assert_eq!(config.hide_out_of_stock_items, expected);
            }

            /// Property: price decimals are accepted up to decimal precision and rejected past it.
            #[test]
            fn price_decimals_are_bounded(decimals in 0u32..64) {
                let raw = decimals.to_string();
                let loaded = StoreConfig::from_lookup(lookup(&[("VARISTORE_PRICE_DECIMALS", raw.as_str())]));
                if decimals <= 28 {
                    prop_assert_eq!(loaded.unwrap().price_decimals, decimals);
                } else {
                    prop_assert!(loaded.is_err());
                }
            }

            /// Property: any configured TTL converts to a non-negative duration.
            #[test]
            fn any_ttl_converts(ttl in any::<u64>()) {
                let config = StoreConfig {
                    prices_ttl_secs: ttl,
                    ..StoreConfig::default()
                };
                prop_assert!(config.prices_ttl() >= Duration::zero());
            }
        }
    }
}
