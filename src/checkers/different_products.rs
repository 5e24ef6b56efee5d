//! Distinct product count checker

use rustc_hash::FxHashSet;

use crate::{
    checkers::ConditionChecker,
    context::PricingContext,
    discounts::conditions::{ConditionType, DiscountCondition},
};

/// Evaluates `DIFFERENT_PRODUCTS_COUNT`: the basket must hold at least `count` distinct products.
///
/// Lines without a product association (event tickets) do not count.
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferentProductsCountChecker;

impl ConditionChecker for DifferentProductsCountChecker {
    fn handles(&self, kind: ConditionType) -> bool {
        kind == ConditionType::DifferentProductsCount
    }

    fn evaluate(&self, condition: &DiscountCondition, ctx: &PricingContext<'_>) -> bool {
        let DiscountCondition::DifferentProductsCount { count } = condition else {
            return true;
        };

        let products: FxHashSet<_> = ctx
            .basket()
            .iter()
            .filter_map(|item| {
                item.product_id().or_else(|| {
                    ctx.catalog()
                        .offer(item.offer_id())
                        .and_then(|offer| offer.product_id)
                })
            })
            .collect();

        products.len() >= usize::try_from(*count).unwrap_or(usize::MAX)
    }
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
        discounts::{Discount, DiscountType, ValueType},
    };

    fn discount(count: u32) -> Discount {
        Discount::new(1, DiscountType::CartTotal, ValueType::Percent, Decimal::TEN)
            .with_condition(DiscountCondition::DifferentProductsCount { count })
    }

    #[test]
    fn counts_distinct_products() -> TestResult {
        let basket = Basket::with_items(
            [
                BasketItem::new(1, 10, Money::from_minor(100, GBP)).with_product(1),
                BasketItem::new(2, 11, Money::from_minor(100, GBP)).with_product(1),
                BasketItem::new(3, 12, Money::from_minor(100, GBP)).with_product(2),
                BasketItem::new(4, 13, Money::from_minor(100, GBP)),
            ],
            GBP,
        )?;
        let ctx = PricingContext::new(basket, Catalog::new());

        assert!(DifferentProductsCountChecker.check(&discount(2), &ctx));
        assert!(!DifferentProductsCountChecker.check(&discount(3), &ctx));

        Ok(())
    }

    #[test]
    fn ignores_other_conditions() -> TestResult {
        let ctx = PricingContext::new(Basket::new(GBP), Catalog::new());
        let first_order = Discount::new(
            1,
            DiscountType::CartTotal,
            ValueType::Percent,
            Decimal::TEN,
        )
        .with_condition(DiscountCondition::FirstOrder)
        .with_condition(DiscountCondition::MinPriceOrder {
            min_price: Decimal::ONE_HUNDRED,
        });

        assert!(DifferentProductsCountChecker.check(&first_order, &ctx));

        Ok(())
    }
}
