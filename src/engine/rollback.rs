//! Rollback

use crate::context::PricingContext;

/// Undo every applied discount.
///
/// Lines and delivery options return to their baseline prices and are re-keyed by id; the ledger
/// and attribution map are cleared. Captured possible delivery discounts are kept. Calling this
/// on a clean context changes nothing.
pub fn rollback(ctx: &mut PricingContext<'_>) {
    ctx.applied.clear();
    ctx.basket_items_by_discounts.clear();
    ctx.basket.restore();
    ctx.deliveries.restore();
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use super::*;
    use crate::{
        basket::{Basket, BasketItem},
        catalog::Catalog,
        deliveries::{Deliveries, Delivery},
        discounts::{Discount, DiscountType, ValueType},
        engine::apply::apply,
    };

    fn snapshot(ctx: &PricingContext<'_>) -> (Vec<(u64, i64, bool)>, Option<i64>, usize, usize) {
        (
            ctx.basket()
                .iter()
                .map(|item| (item.id(), item.price().to_minor_units(), item.line().has_cost()))
                .collect(),
            ctx.deliveries()
                .current()
                .map(|delivery| delivery.price().to_minor_units()),
            ctx.applied().len(),
            ctx.basket_items_by_discounts().len(),
        )
    }

    #[test]
    fn rollback_is_idempotent() -> TestResult {
        let basket = Basket::with_items(
            [
                BasketItem::new(1, 10, Money::from_minor(1000, GBP)),
                BasketItem::new(2, 20, Money::from_minor(700, GBP)),
            ],
            GBP,
        )?;
        let mut ctx = PricingContext::new(basket, Catalog::new()).with_deliveries(Deliveries::new([
            Delivery::new(1, Money::from_minor(500, GBP)).selected(),
        ]))?;

        apply(
            &[
                Discount::new(1, DiscountType::AnyOffer, ValueType::Percent, Decimal::from(30)),
                Discount::new(2, DiscountType::CartTotal, ValueType::Percent, Decimal::from(10)),
                Discount::new(3, DiscountType::Delivery, ValueType::FixedAmount, Decimal::ONE),
                Discount::new(4, DiscountType::Offer, ValueType::Percent, Decimal::ONE)
                    .with_offer(10),
            ],
            &mut ctx,
        )?;

        assert_eq!(
            ctx.deliveries().current().map(|delivery| delivery.price().to_minor_units()),
            Some(400)
        );

        rollback(&mut ctx);

        let once = snapshot(&ctx);

        rollback(&mut ctx);

        assert_eq!(snapshot(&ctx), once);
        assert_eq!(
            once,
            (vec![(1, 1000, false), (2, 700, false)], Some(500), 0, 0)
        );

        Ok(())
    }
}
