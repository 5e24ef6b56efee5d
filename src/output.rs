//! Output
//!
//! Normalizes the ledger once a calculation finishes and builds the caller-facing report.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    basket::{BasketItemId, BasketItemSnapshot},
    context::PricingContext,
    deliveries::{DeliveryId, DeliverySnapshot},
    discounts::{Discount, DiscountId, DiscountType, conditions::ConditionType},
    pricing::subtotal_minor,
};

/// Errors that can occur when rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report currency is not an ISO currency.
    #[error("unknown currency {0}")]
    UnknownCurrency(String),

    /// IO error
    #[error("IO error")]
    IO,
}

/// An applied discount as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDiscountLine {
    /// Discount id
    pub id: DiscountId,

    /// Discount name
    pub name: String,

    /// Discount type
    #[serde(rename = "type")]
    pub kind: DiscountType,

    /// Total change in minor units
    pub change: i64,

    /// Condition types attached to the discount
    pub conditions: Vec<ConditionType>,

    /// Whether the discount combined with all others
    pub summarizable_with_all: bool,
}

/// A basket line and the discounts attributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    /// Line prices
    #[serde(flatten)]
    pub item: BasketItemSnapshot,

    /// Discounts that reduced the line
    pub discounts: Vec<DiscountId>,
}

/// Price a delivery option would cost with its possible discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PossibleDeliveryLine {
    /// Delivery option id
    pub delivery_id: DeliveryId,

    /// Original price in minor units
    pub cost: i64,

    /// Price after possible discounts in minor units
    pub price: i64,
}

/// Result of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDiscountsReport {
    /// ISO code of the currency all amounts are in
    pub currency: String,

    /// Applied discounts with a non-zero change, in application order
    pub discounts: Vec<AppliedDiscountLine>,

    /// Basket lines
    pub items: Vec<ReportItem>,

    /// The current delivery
    pub delivery: Option<DeliverySnapshot>,

    /// Possible prices of every delivery option
    pub possible_deliveries: Vec<PossibleDeliveryLine>,

    /// Basket total before discounts in minor units
    pub subtotal: i64,

    /// Basket total after discounts in minor units
    pub total: i64,

    /// Sum of all reported changes in minor units
    pub total_change: i64,
}

impl AppliedDiscountsReport {
    /// Savings on the basket as a fraction of the subtotal.
    pub fn savings_percent(&self) -> Percentage {
        if self.subtotal == 0 {
            return Percentage::from(0.0);
        }

        let savings = Decimal::from(self.subtotal - self.total);

        Percentage::from(savings / Decimal::from(self.subtotal))
    }

    /// Look up a reported line.
    pub fn item(&self, id: BasketItemId) -> Option<&ReportItem> {
        self.items.iter().find(|line| line.item.id == id)
    }

    /// Look up a reported discount.
    pub fn discount(&self, id: DiscountId) -> Option<&AppliedDiscountLine> {
        self.discounts.iter().find(|line| line.id == id)
    }

    /// Render the report as terminal tables.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the currency is unknown or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let currency = iso::find(&self.currency)
            .ok_or_else(|| ReportError::UnknownCurrency(self.currency.clone()))?;
        let money = |minor: i64| Money::from_minor(minor, currency).to_string();

        let names: FxHashMap<DiscountId, &str> = self
            .discounts
            .iter()
            .map(|line| (line.id, line.name.as_str()))
            .collect();

        let mut builder = Builder::default();

        builder.push_record(["", "Offer", "Qty", "Base Price", "Discounted Price", "Discounts"]);

        for (index, line) in self.items.iter().enumerate() {
            let discounts = line
                .discounts
                .iter()
                .map(|id| names.get(id).map_or_else(|| format!("#{id}"), ToString::to_string))
                .collect::<Vec<_>>()
                .join("\n");

            builder.push_record([
                format!("#{}", index + 1),
                line.item.offer_id.to_string(),
                line.item.qty.to_string(),
                money(line.item.cost),
                money(line.item.price),
                discounts,
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..5), Alignment::right());

        writeln!(out, "\n{}", colorize_borders(&table.to_string()))
            .map_err(|_err| ReportError::IO)?;

        if let Some(delivery) = &self.delivery {
            writeln!(
                out,
                " Delivery #{}: {} (was {})",
                delivery.id,
                money(delivery.price),
                money(delivery.cost)
            )
            .map_err(|_err| ReportError::IO)?;
        }

        for possible in &self.possible_deliveries {
            writeln!(
                out,
                " Possible delivery #{}: {}",
                possible.delivery_id,
                money(possible.price)
            )
            .map_err(|_err| ReportError::IO)?;
        }

        let savings_points =
            ((self.savings_percent() * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2);

        writeln!(out, " Subtotal: {}", money(self.subtotal)).map_err(|_err| ReportError::IO)?;
        writeln!(out, " \x1b[1mTotal:\x1b[0m {}", money(self.total))
            .map_err(|_err| ReportError::IO)?;
        writeln!(out, " Savings: ({savings_points:.2}%) {}", money(self.total_change))
            .map_err(|_err| ReportError::IO)?;

        writeln!(out).map_err(|_err| ReportError::IO)
    }
}

/// Builds the report for a finished calculation.
#[derive(Debug, Clone, Copy)]
pub struct DiscountOutput<'d> {
    discounts: &'d [Discount],
}

impl<'d> DiscountOutput<'d> {
    /// Create an output over the fetched discount definitions.
    pub fn new(discounts: &'d [Discount]) -> Self {
        Self { discounts }
    }

    /// Normalize the ledger of `ctx` and build the report.
    ///
    /// Zero-change entries are dropped from the ledger, attributions of dropped discounts are
    /// removed, and both are written back into the context.
    pub fn finish(&self, ctx: &mut PricingContext<'_>) -> AppliedDiscountsReport {
        ctx.applied.retain(|entry| entry.change.to_minor_units() != 0);

        let applied = &ctx.applied;

        ctx.basket_items_by_discounts.retain(|_, attributions| {
            attributions.retain(|attribution| applied.contains(attribution.discount_id));

            !attributions.is_empty()
        });

        let discounts = ctx
            .applied
            .iter()
            .map(|entry| {
                let definition = self
                    .discounts
                    .iter()
                    .find(|discount| discount.id == entry.discount_id);

                AppliedDiscountLine {
                    id: entry.discount_id,
                    name: definition.map(|discount| discount.name.clone()).unwrap_or_default(),
                    kind: definition.map_or(DiscountType::Unrecognized, |discount| discount.kind),
                    change: entry.change.to_minor_units(),
                    conditions: entry.conditions.to_vec(),
                    summarizable_with_all: entry.summarizable_with_all,
                }
            })
            .collect::<Vec<_>>();

        let items = ctx
            .basket
            .iter()
            .map(|item| ReportItem {
                item: BasketItemSnapshot::from(item),
                discounts: ctx
                    .basket_items_by_discounts
                    .get(&item.id())
                    .map(|attributions| {
                        attributions
                            .iter()
                            .map(|attribution| attribution.discount_id)
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        let possible_deliveries = ctx
            .possible_delivery_discounts
            .iter()
            .map(|possible| PossibleDeliveryLine {
                delivery_id: possible.delivery_id,
                cost: possible.cost.to_minor_units(),
                price: possible.price.to_minor_units(),
            })
            .collect();

        let subtotal = ctx
            .basket
            .iter()
            .fold(0_i64, |acc, item| {
                acc.saturating_add(
                    item.cost()
                        .to_minor_units()
                        .saturating_mul(i64::from(item.qty())),
                )
            });

        let total = subtotal_minor(ctx.basket.iter().map(|item| (item.line(), item.qty())));
        let total_change = discounts.iter().map(|line| line.change).sum();

        AppliedDiscountsReport {
            currency: ctx.currency().iso_alpha_code.to_string(),
            discounts,
            items,
            delivery: ctx.deliveries.current().map(DeliverySnapshot::from),
            possible_deliveries,
            subtotal,
            total,
            total_change,
        }
    }
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::GBP;
    use smallvec::SmallVec;
    use testresult::TestResult;

    use super::*;
    use crate::{
        basket::{Basket, BasketItem},
        catalog::Catalog,
        discounts::ValueType,
        engine::apply::apply,
        ledger::AppliedDiscount,
    };

    fn context<'a>() -> Result<PricingContext<'a>, Box<dyn std::error::Error>> {
        let basket = Basket::with_items(
            [
                BasketItem::new(1, 10, Money::from_minor(1000, GBP)),
                BasketItem::new(2, 20, Money::from_minor(500, GBP)).with_qty(2),
            ],
            GBP,
        )?;

        Ok(PricingContext::new(basket, Catalog::new()))
    }

    #[test]
    fn finish_drops_zero_change_entries() -> TestResult {
        let mut ctx = context()?;
        let discounts = vec![
            Discount::new(1, DiscountType::Offer, ValueType::Percent, Decimal::from(10))
                .with_name("Ten off")
                .with_offer(10),
            Discount::new(2, DiscountType::Offer, ValueType::Percent, Decimal::from(10))
                .with_offer(99),
        ];

        apply(&discounts, &mut ctx)?;

        assert_eq!(ctx.applied().len(), 2);

        let report = DiscountOutput::new(&discounts).finish(&mut ctx);

        assert_eq!(ctx.applied().len(), 1);
        assert_eq!(report.discounts.len(), 1);
        assert_eq!(report.discount(1).map(|line| line.name.as_str()), Some("Ten off"));
        assert_eq!(report.item(1).map(|line| line.discounts.clone()), Some(vec![1]));
        assert_eq!(report.subtotal, 2000);
        assert_eq!(report.total, 1900);
        assert_eq!(report.total_change, 100);
        assert_eq!(report.currency, "GBP");

        Ok(())
    }

    #[test]
    fn finish_prunes_attributions_of_dropped_discounts() -> TestResult {
        let mut ctx = context()?;
        let discounts = vec![
            Discount::new(1, DiscountType::Offer, ValueType::Percent, Decimal::from(10))
                .with_offer(10),
        ];

        apply(&discounts, &mut ctx)?;

        // Simulate an entry whose change was later netted to zero.
        ctx.applied.clear();
        ctx.applied.insert(AppliedDiscount {
            discount_id: 1,
            change: Money::from_minor(0, GBP),
            conditions: SmallVec::new(),
            summarizable_with_all: false,
        });

        let report = DiscountOutput::new(&discounts).finish(&mut ctx);

        assert!(report.discounts.is_empty());
        assert!(ctx.basket_items_by_discounts().is_empty());

        Ok(())
    }

    #[test]
    fn savings_percent_is_relative_to_subtotal() -> TestResult {
        let mut ctx = context()?;
        let discounts = vec![
            Discount::new(1, DiscountType::CartTotal, ValueType::Percent, Decimal::from(25)),
        ];

        apply(&discounts, &mut ctx)?;

        let report = DiscountOutput::new(&discounts).finish(&mut ctx);

        assert_eq!(report.savings_percent(), Percentage::from(0.25));

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_summary() -> TestResult {
        let mut ctx = context()?;
        let discounts = vec![
            Discount::new(1, DiscountType::Offer, ValueType::Percent, Decimal::from(10))
                .with_name("Ten off")
                .with_offer(10),
        ];

        apply(&discounts, &mut ctx)?;

        let report = DiscountOutput::new(&discounts).finish(&mut ctx);
        let mut out = Vec::new();

        report.write_to(&mut out)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Ten off"));
        assert!(rendered.contains("Subtotal"));
        assert!(rendered.contains("(5.00%)"));

        Ok(())
    }

    #[test]
    fn write_to_rejects_unknown_currency() -> TestResult {
        let mut ctx = context()?;
        let mut report = DiscountOutput::new(&[]).finish(&mut ctx);

        report.currency = "XYZ".to_string();

        let result = report.write_to(Vec::new());

        assert!(matches!(result, Err(ReportError::UnknownCurrency(code)) if code == "XYZ"));

        Ok(())
    }
}
