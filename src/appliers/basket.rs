//! Cart total applier

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    appliers::{DiscountApplier, accepts, attribute, line_total},
    context::PricingContext,
    discounts::{Discount, DiscountError, ValueType, minor_units},
};

/// Reduces the basket total.
///
/// Eligible lines are priced lines that accept the discount. A percentage reduces each of them by
/// that percentage. A fixed amount, capped at the eligible subtotal, is spread across them in
/// proportion to their line totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasketApplier;

impl<'a> DiscountApplier<'a> for BasketApplier {
    fn apply(
        &self,
        discount: &Discount,
        ctx: &mut PricingContext<'a>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let currency = ctx.currency();

        // (line index, unit price, qty)
        let eligible: SmallVec<[(usize, i64, u32); 10]> = ctx
            .basket
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.price().to_minor_units() > 0
                    && item.qty() > 0
                    && accepts(discount, ctx.basket_items_by_discounts.get(&item.id()))
            })
            .map(|(index, item)| (index, item.price().to_minor_units(), item.qty()))
            .collect();

        if eligible.is_empty() {
            return Ok(Money::from_minor(0, currency));
        }

        let reductions = match discount.value_type {
            ValueType::Percent => eligible
                .iter()
                .map(|&(index, price, _)| {
                    discount
                        .reduction_minor(price, currency)
                        .map(|reduction| (index, reduction))
                })
                .collect::<Result<SmallVec<[(usize, i64); 10]>, _>>()?,
            ValueType::FixedAmount => {
                spread_fixed(minor_units(discount.value, currency)?, &eligible)
            }
        };

        let mut change = 0_i64;

        for (index, item) in ctx.basket.iter_mut().enumerate() {
            let Some(&(_, reduction)) = reductions.iter().find(|(line, _)| *line == index) else {
                continue;
            };

            let applied = item.line_mut().reduce(reduction);

            if applied == 0 {
                continue;
            }

            change = change.saturating_add(line_total(applied, item.qty()));

            attribute(&mut ctx.basket_items_by_discounts, item.id(), discount);

            trace!(
                discount = discount.id,
                item = item.id(),
                unit_reduction = applied,
                "reduced line"
            );
        }

        Ok(Money::from_minor(change, currency))
    }
}

/// Split `amount` into per-unit reductions proportional to each line's total.
///
/// Shares are floored; the remainder is then handed out greedily in line order, as far as whole
/// units allow.
fn spread_fixed(amount: i64, eligible: &[(usize, i64, u32)]) -> SmallVec<[(usize, i64); 10]> {
    let subtotal: i128 = eligible
        .iter()
        .map(|&(_, price, qty)| i128::from(price) * i128::from(qty))
        .sum();

    let amount = i128::from(amount.max(0)).min(subtotal);

    if amount == 0 || subtotal == 0 {
        return eligible.iter().map(|&(index, _, _)| (index, 0)).collect();
    }

    let mut units: SmallVec<[(usize, i128, i128, i128); 10]> = eligible
        .iter()
        .map(|&(index, price, qty)| {
            let price = i128::from(price);

            (index, (amount * price) / subtotal, price, i128::from(qty))
        })
        .collect();

    let mut remainder = amount
        - units
            .iter()
            .map(|&(_, unit, _, qty)| unit * qty)
            .sum::<i128>();

    for (_, unit, price, qty) in &mut units {
        if remainder <= 0 {
            break;
        }

        let extra = (remainder / *qty).min(*price - *unit);

        *unit += extra;
        remainder -= extra * *qty;
    }

    units
        .into_iter()
        .map(|(index, unit, _, _)| (index, i64::try_from(unit).unwrap_or(i64::MAX)))
        .collect()
}
