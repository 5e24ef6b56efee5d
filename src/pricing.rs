//! Prices
//!
//! Mutable price state shared by basket items and delivery options.

use rusty_money::{Money, iso::Currency};

/// Current price of a line together with its discount baseline.
///
/// `cost` stays empty until the first discount touches the line; from then on it holds the
/// pre-discount price, which is what a rollback restores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePrice<'a> {
    price: Money<'a, Currency>,
    cost: Option<Money<'a, Currency>>,
    discount: Option<Money<'a, Currency>>,
}

impl<'a> LinePrice<'a> {
    /// Create an undiscounted line price.
    #[must_use]
    pub fn new(price: Money<'a, Currency>) -> Self {
        Self {
            price,
            cost: None,
            discount: None,
        }
    }

    /// Current price.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Original price, falling back to the current price when no discount was ever applied.
    pub fn cost(&self) -> &Money<'a, Currency> {
        self.cost.as_ref().unwrap_or(&self.price)
    }

    /// Whether a discount baseline has been recorded.
    pub fn has_cost(&self) -> bool {
        self.cost.is_some()
    }

    /// Accumulated reduction, if any discount touched the line.
    pub fn discount(&self) -> Option<&Money<'a, Currency>> {
        self.discount.as_ref()
    }

    /// Currency of the line.
    pub fn currency(&self) -> &'a Currency {
        self.price.currency()
    }

    /// Reduce the price by up to `reduction_minor`, never below zero.
    ///
    /// Returns the reduction actually applied, in minor units.
    pub(crate) fn reduce(&mut self, reduction_minor: i64) -> i64 {
        let currency = self.currency();
        let price_minor = self.price.to_minor_units();
        let applied = reduction_minor.clamp(0, price_minor.max(0));

        if applied == 0 {
            return 0;
        }

        let previous = self
            .discount
            .map_or(0, |discount| discount.to_minor_units());

        self.cost.get_or_insert(self.price);
        self.price = Money::from_minor(price_minor - applied, currency);
        self.discount = Some(Money::from_minor(previous + applied, currency));

        applied
    }

    /// Force the price to zero, attributing the whole cost as discount.
    pub(crate) fn make_free(&mut self) {
        let currency = self.currency();
        let cost = *self.cost();

        self.cost = Some(cost);
        self.price = Money::from_minor(0, currency);
        self.discount = Some(cost);
    }

    /// Restore the price to its baseline and forget the discount state.
    pub(crate) fn restore(&mut self) {
        if let Some(cost) = self.cost.take() {
            self.price = cost;
        }

        self.discount = None;
    }
}

/// Total of `price × qty` over the given lines, in minor units.
pub fn subtotal_minor<'l, 'a: 'l>(
    lines: impl IntoIterator<Item = (&'l LinePrice<'a>, u32)>,
) -> i64 {
    lines.into_iter().fold(0_i64, |acc, (line, qty)| {
        acc.saturating_add(line.price().to_minor_units().saturating_mul(i64::from(qty)))
    })
}
