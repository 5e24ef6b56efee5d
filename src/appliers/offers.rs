//! Offer applier

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use tracing::trace;

use crate::{
    appliers::{DiscountApplier, accepts, attribute, line_total},
    catalog::OfferId,
    context::PricingContext,
    discounts::{Discount, DiscountError},
};

/// Reduces every basket line selling one of a set of offers.
#[derive(Debug, Clone, Default)]
pub struct OfferApplier {
    offer_ids: FxHashSet<OfferId>,
}

impl OfferApplier {
    /// Create an applier scoped to `offer_ids`.
    pub fn new(offer_ids: impl IntoIterator<Item = OfferId>) -> Self {
        Self {
            offer_ids: offer_ids.into_iter().collect(),
        }
    }
}

impl<'a> DiscountApplier<'a> for OfferApplier {
    fn apply(
        &self,
        discount: &Discount,
        ctx: &mut PricingContext<'a>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let currency = ctx.currency();
        let mut change = 0_i64;

        for item in ctx.basket.iter_mut() {
            if !self.offer_ids.contains(&item.offer_id()) {
                continue;
            }

            if !accepts(discount, ctx.basket_items_by_discounts.get(&item.id())) {
                trace!(discount = discount.id, item = item.id(), "line refuses discount");

                continue;
            }

            let reduction = discount.reduction_minor(item.price().to_minor_units(), currency)?;
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

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;
    use crate::{
        basket::{Basket, BasketItem},
        catalog::Catalog,
        discounts::{DiscountType, ValueType},
    };

    fn context<'a>() -> Result<PricingContext<'a>, Box<dyn std::error::Error>> {
        let basket = Basket::with_items(
            [
                BasketItem::new(1, 10, Money::from_minor(1000, GBP)).with_qty(3),
                BasketItem::new(2, 20, Money::from_minor(400, GBP)),
            ],
            GBP,
        )?;

        Ok(PricingContext::new(basket, Catalog::new()))
    }

    #[test]
    fn percent_reduces_scoped_lines_per_unit() -> TestResult {
        let mut ctx = context()?;
        let discount = Discount::new(1, DiscountType::Offer, ValueType::Percent, Decimal::from(10));

        let change = OfferApplier::new([10]).apply(&discount, &mut ctx)?;

        assert_eq!(change, Money::from_minor(300, GBP));
        assert_eq!(
            ctx.basket().get(1).map(|item| item.price().to_minor_units()),
            Some(900)
        );
        assert_eq!(
            ctx.basket().get(2).map(|item| item.price().to_minor_units()),
            Some(400)
        );
        assert!(ctx.basket_items_by_discounts().contains_key(&1));
        assert!(!ctx.basket_items_by_discounts().contains_key(&2));

        Ok(())
    }

    #[test]
    fn fixed_amount_is_clamped_at_zero() -> TestResult {
        let mut ctx = context()?;
        let discount = Discount::new(
            1,
            DiscountType::Offer,
            ValueType::FixedAmount,
            Decimal::from(5),
        );

        let change = OfferApplier::new([20]).apply(&discount, &mut ctx)?;

        assert_eq!(change, Money::from_minor(400, GBP));
        assert_eq!(
            ctx.basket().get(2).map(|item| item.price().to_minor_units()),
            Some(0)
        );

        Ok(())
    }

    #[test]
    fn incompatible_line_is_skipped() -> TestResult {
        let mut ctx = context()?;
        let first = Discount::new(1, DiscountType::Offer, ValueType::Percent, Decimal::from(10));
        let second = Discount::new(2, DiscountType::Offer, ValueType::Percent, Decimal::from(10));

        OfferApplier::new([10]).apply(&first, &mut ctx)?;
        let change = OfferApplier::new([10, 20]).apply(&second, &mut ctx)?;

        assert_eq!(change, Money::from_minor(40, GBP));
        assert_eq!(
            ctx.basket().get(1).map(|item| item.price().to_minor_units()),
            Some(900)
        );

        Ok(())
    }
}
