//! Tax settings and display-price conversion.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use varistore_core::{DomainError, ValueObject};

use crate::price::DEFAULT_PRICE_DECIMALS;

/// Whether shop prices are shown including or excluding tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxDisplay {
    Incl,
    Excl,
}

impl TaxDisplay {
    pub fn as_str(self) -> &'static str {
        match self {
            TaxDisplay::Incl => "incl",
            TaxDisplay::Excl => "excl",
        }
    }
}

impl Default for TaxDisplay {
    fn default() -> Self {
        TaxDisplay::Excl
    }
}

impl core::str::FromStr for TaxDisplay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "incl" => Ok(TaxDisplay::Incl),
            "excl" => Ok(TaxDisplay::Excl),
            other => Err(DomainError::validation(format!(
                "tax display must be 'incl' or 'excl', got '{other}'"
            ))),
        }
    }
}

/// A single tax rate applying at the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: u64,
    pub label: String,
    /// Percentage, e.g. `20` for 20%.
    pub rate: Decimal,
    pub compound: bool,
    pub priority: u32,
}

impl ValueObject for TaxRate {}

/// Tax configuration relevant to displayed prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Whether catalog prices are entered inclusive of tax.
    pub prices_include_tax: bool,
    pub tax_display_shop: TaxDisplay,
    pub rates: Vec<TaxRate>,
    pub price_decimals: u32,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            prices_include_tax: false,
            tax_display_shop: TaxDisplay::Excl,
            rates: Vec::new(),
            price_decimals: DEFAULT_PRICE_DECIMALS,
        }
    }
}

impl TaxSettings {
    /// Convert a single-quantity price to the shop's display convention.
    pub fn display_price(&self, price: Decimal) -> Decimal {
        match self.tax_display_shop {
            TaxDisplay::Incl => self.price_including_tax(price),
            TaxDisplay::Excl => self.price_excluding_tax(price),
        }
    }

    pub fn price_including_tax(&self, price: Decimal) -> Decimal {
        let gross = if self.prices_include_tax {
            price
        } else {
            price + exclusive_tax(price, &self.rates)
        };
        self.round(gross)
    }

    pub fn price_excluding_tax(&self, price: Decimal) -> Decimal {
        let net = if self.prices_include_tax {
            price - inclusive_tax(price, &self.rates)
        } else {
            price
        };
        self.round(net)
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.price_decimals, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn sorted_rates(rates: &[TaxRate]) -> Vec<&TaxRate> {
    let mut sorted: Vec<&TaxRate> = rates.iter().collect();
    sorted.sort_by_key(|r| (r.priority, r.id));
    sorted
}

fn percent(rate: Decimal) -> Decimal {
    rate / Decimal::ONE_HUNDRED
}

/// Tax owed on a net price.
///
/// Regular rates apply to the net price; compound rates apply, in priority
/// order, to the net price plus every tax computed before them.
fn exclusive_tax(price: Decimal, rates: &[TaxRate]) -> Decimal {
    let sorted = sorted_rates(rates);
    let regular: Decimal = sorted
        .iter()
        .filter(|r| !r.compound)
        .map(|r| price * percent(r.rate))
        .sum();

    let mut total = regular;
    for rate in sorted.iter().filter(|r| r.compound) {
        total += (price + total) * percent(rate.rate);
    }
    total
}

/// Tax contained in a gross price.
///
/// Compound rates are peeled off first, last-applied first; regular rates then
/// share what remains in proportion to their percentages.
fn inclusive_tax(price: Decimal, rates: &[TaxRate]) -> Decimal {
    let sorted = sorted_rates(rates);

    let mut remaining = price;
    let mut total = Decimal::ZERO;
    for rate in sorted.iter().rev().filter(|r| r.compound) {
        let tax = remaining - remaining / (Decimal::ONE + percent(rate.rate));
        total += tax;
        remaining -= tax;
    }

    let regular_sum: Decimal = sorted.iter().filter(|r| !r.compound).map(|r| percent(r.rate)).sum();
    if !regular_sum.is_zero() {
        total += remaining - remaining / (Decimal::ONE + regular_sum);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rate(id: u64, percent: &str, compound: bool, priority: u32) -> TaxRate {
        TaxRate {
            id,
            label: format!("rate-{id}"),
            rate: dec(percent),
            compound,
            priority,
        }
    }

    fn settings(prices_include_tax: bool, rates: Vec<TaxRate>) -> TaxSettings {
        TaxSettings {
            prices_include_tax,
            rates,
            ..TaxSettings::default()
        }
    }

    #[test]
    fn net_prices_gain_tax_when_including() {
        let tax = settings(false, vec![rate(1, "20", false, 1)]);
        assert_eq!(tax.price_including_tax(dec("10")), dec("12.00"));
        assert_eq!(tax.price_excluding_tax(dec("10")), dec("10"));
    }

    #[test]
    fn gross_prices_lose_tax_when_excluding() {
        let tax = settings(true, vec![rate(1, "20", false, 1)]);
        assert_eq!(tax.price_excluding_tax(dec("12")), dec("10.00"));
        assert_eq!(tax.price_including_tax(dec("12")), dec("12"));
    }

    #[test]
    fn compound_rates_apply_on_top_of_regular_tax() {
        let tax = settings(false, vec![rate(1, "10", false, 1), rate(2, "10", true, 2)]);
        // 100 + 10 regular, then 10% of 110 compound.
        assert_eq!(tax.price_including_tax(dec("100")), dec("121.00"));
    }

    #[test]
    fn inclusive_compound_rates_invert_exclusive_ones() {
        let rates = vec![rate(1, "10", false, 1), rate(2, "10", true, 2)];
        let tax = settings(true, rates);
        assert_eq!(tax.price_excluding_tax(dec("121")), dec("100.00"));
    }

    #[test]
    fn display_price_follows_shop_preference() {
        let mut tax = settings(false, vec![rate(1, "20", false, 1)]);
        tax.tax_display_shop = TaxDisplay::Incl;
        assert_eq!(tax.display_price(dec("5")), dec("6.00"));
        tax.tax_display_shop = TaxDisplay::Excl;
        assert_eq!(tax.display_price(dec("5")), dec("5"));
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        let tax = settings(false, vec![rate(1, "10", false, 1)]);
        let gross = tax.price_including_tax(dec("0.95"));
        assert_eq!(gross, dec("1.05"));
        assert_eq!(crate::price::format_decimal(&gross.to_string(), 2), dec("1.05"));
    }

    #[test]
    fn no_rates_means_no_tax() {
        let tax = settings(true, vec![]);
        assert_eq!(tax.price_excluding_tax(dec("9.99")), dec("9.99"));
    }

    #[test]
    fn tax_display_parses_known_values_only() {
        assert_eq!("incl".parse::<TaxDisplay>().unwrap(), TaxDisplay::Incl);
        assert_eq!(" excl ".parse::<TaxDisplay>().unwrap(), TaxDisplay::Excl);
        assert!("both".parse::<TaxDisplay>().is_err());
    }
}
