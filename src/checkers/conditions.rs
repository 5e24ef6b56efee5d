//! Generic condition checker

use rustc_hash::FxHashSet;

use crate::{
    basket::BasketItem,
    checkers::ConditionChecker,
    context::PricingContext,
    discounts::{
        conditions::{ConditionType, DiscountCondition},
        minor_units,
    },
};

/// Evaluates every condition kind except the distinct-product count.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountConditionChecker;

impl ConditionChecker for DiscountConditionChecker {
    fn handles(&self, kind: ConditionType) -> bool {
        kind != ConditionType::DifferentProductsCount
    }

    fn evaluate(&self, condition: &DiscountCondition, ctx: &PricingContext<'_>) -> bool {
        let customer = ctx.customer();

        match condition {
            DiscountCondition::FirstOrder => customer.orders_count == 0,
            DiscountCondition::MinPriceOrder { min_price } => {
                minor_units(*min_price, ctx.currency())
                    .is_ok_and(|min| ctx.basket().subtotal_minor() >= min)
            }
            DiscountCondition::MinPriceBrand { brands, min_price } => {
                let subtotal = subtotal_where(ctx, |item| {
                    ctx.catalog()
                        .offer(item.offer_id())
                        .and_then(|offer| offer.brand_id)
                        .is_some_and(|brand| brands.contains(&brand))
                });

                minor_units(*min_price, ctx.currency()).is_ok_and(|min| subtotal >= min)
            }
            DiscountCondition::MinPriceCategory {
                categories,
                min_price,
            } => {
                let roots: FxHashSet<_> = categories.iter().copied().collect();
                let subtotal = subtotal_where(ctx, |item| {
                    ctx.catalog()
                        .offer(item.offer_id())
                        .and_then(|offer| offer.category_id)
                        .is_some_and(|category| ctx.catalog().descends_from(category, &roots))
                });

                minor_units(*min_price, ctx.currency()).is_ok_and(|min| subtotal >= min)
            }
            DiscountCondition::EveryUnitProduct { offer, count } => ctx
                .basket()
                .iter()
                .any(|item| item.offer_id() == *offer && item.qty() >= *count),
            DiscountCondition::DeliveryMethod { methods } => ctx
                .deliveries()
                .current()
                .and_then(|delivery| delivery.method())
                .is_some_and(|method| methods.contains(&method)),
            DiscountCondition::PayMethod { methods } => ctx
                .payment()
                .method
                .is_some_and(|method| methods.contains(&method)),
            DiscountCondition::Region { regions } => customer
                .region
                .is_some_and(|region| regions.contains(&region)),
            DiscountCondition::Customer { customers } => customer
                .id
                .is_some_and(|id| customers.contains(&id)),
            DiscountCondition::OrderSequenceNumber {
                order_sequence_number,
            } => customer.orders_count.checked_add(1) == Some(*order_sequence_number),
            DiscountCondition::Bundle { bundles } => ctx
                .basket()
                .iter()
                .any(|item| item.bundle_id().is_some_and(|bundle| bundles.contains(&bundle))),
            DiscountCondition::Merchant { merchants } => ctx.basket().iter().any(|item| {
                ctx.catalog()
                    .offer(item.offer_id())
                    .and_then(|offer| offer.merchant_id)
                    .is_some_and(|merchant| merchants.contains(&merchant))
            }),
            DiscountCondition::DiscountSynergy { .. }
            | DiscountCondition::DifferentProductsCount { .. } => true,
            DiscountCondition::Unrecognized => false,
        }
    }
}

fn subtotal_where(ctx: &PricingContext<'_>, include: impl Fn(&BasketItem<'_>) -> bool) -> i64 {
    ctx.basket()
        .iter()
        .filter(|item| include(item))
        .fold(0_i64, |acc, item| {
            acc.saturating_add(
                item.price()
                    .to_minor_units()
                    .saturating_mul(i64::from(item.qty())),
            )
        })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use super::*;
    use crate::{
        basket::Basket,
        catalog::{Catalog, Category, Offer},
        context::{Customer, Payment},
        deliveries::{Deliveries, Delivery},
        discounts::{Discount, DiscountType, ValueType},
    };

    fn catalog() -> Catalog {
        Catalog::new()
            .with_category(Category {
                id: 1,
                parent_id: None,
            })
            .with_category(Category {
                id: 2,
                parent_id: Some(1),
            })
            .with_offer(Offer {
                id: 10,
                product_id: Some(100),
                brand_id: Some(7),
                category_id: Some(2),
                merchant_id: Some(50),
            })
            .with_offer(Offer {
                id: 20,
                product_id: Some(200),
                brand_id: Some(8),
                category_id: None,
                merchant_id: Some(60),
            })
    }

    fn context<'a>() -> Result<PricingContext<'a>, Box<dyn std::error::Error>> {
        let basket = Basket::with_items(
            [
                BasketItem::new(1, 10, Money::from_minor(1000, GBP)).with_qty(2),
                BasketItem::new(2, 20, Money::from_minor(500, GBP)).with_bundle(4),
            ],
            GBP,
        )?;

        let ctx = PricingContext::new(basket, catalog())
            .with_deliveries(Deliveries::new([
                Delivery::new(1, Money::from_minor(300, GBP)).with_method(3).selected(),
            ]))?
            .with_customer(Customer {
                id: Some(42),
                roles: vec![],
                segment: None,
                region: Some(9),
                orders_count: 2,
            })
            .with_payment(Payment {
                need_calculate: true,
                method: Some(5),
            });

        Ok(ctx)
    }

    fn holds(condition: DiscountCondition, ctx: &PricingContext<'_>) -> bool {
        let discount = Discount::new(1, DiscountType::CartTotal, ValueType::Percent, Decimal::TEN)
            .with_condition(condition);

        DiscountConditionChecker.check(&discount, ctx)
    }

    #[test]
    fn order_history_conditions() -> TestResult {
        let ctx = context()?;

        assert!(!holds(DiscountCondition::FirstOrder, &ctx));
        assert!(holds(
            DiscountCondition::OrderSequenceNumber {
                order_sequence_number: 3
            },
            &ctx
        ));
        assert!(!holds(
            DiscountCondition::OrderSequenceNumber {
                order_sequence_number: 2
            },
            &ctx
        ));

        Ok(())
    }

    #[test]
    fn min_price_conditions_compare_in_minor_units() -> TestResult {
        let ctx = context()?;

        assert!(holds(
            DiscountCondition::MinPriceOrder {
                min_price: Decimal::from(25)
            },
            &ctx
        ));
        assert!(!holds(
            DiscountCondition::MinPriceOrder {
                min_price: Decimal::new(2501, 2)
            },
            &ctx
        ));
        assert!(holds(
            DiscountCondition::MinPriceBrand {
                brands: vec![7],
                min_price: Decimal::from(20)
            },
            &ctx
        ));
        assert!(!holds(
            DiscountCondition::MinPriceBrand {
                brands: vec![8],
                min_price: Decimal::from(20)
            },
            &ctx
        ));
        assert!(holds(
            DiscountCondition::MinPriceCategory {
                categories: vec![1],
                min_price: Decimal::from(20)
            },
            &ctx
        ));

        Ok(())
    }

    #[test]
    fn basket_content_conditions() -> TestResult {
        let ctx = context()?;

        assert!(holds(DiscountCondition::EveryUnitProduct { offer: 10, count: 2 }, &ctx));
        assert!(!holds(DiscountCondition::EveryUnitProduct { offer: 20, count: 2 }, &ctx));
        assert!(holds(DiscountCondition::Bundle { bundles: vec![4] }, &ctx));
        assert!(!holds(DiscountCondition::Bundle { bundles: vec![5] }, &ctx));
        assert!(holds(DiscountCondition::Merchant { merchants: vec![60] }, &ctx));
        assert!(!holds(DiscountCondition::Merchant { merchants: vec![70] }, &ctx));

        Ok(())
    }

    #[test]
    fn checkout_conditions() -> TestResult {
        let ctx = context()?;

        assert!(holds(DiscountCondition::DeliveryMethod { methods: vec![3] }, &ctx));
        assert!(!holds(DiscountCondition::DeliveryMethod { methods: vec![4] }, &ctx));
        assert!(holds(DiscountCondition::PayMethod { methods: vec![5] }, &ctx));
        assert!(holds(DiscountCondition::Region { regions: vec![9] }, &ctx));
        assert!(holds(DiscountCondition::Customer { customers: vec![42] }, &ctx));
        assert!(!holds(DiscountCondition::Customer { customers: vec![1] }, &ctx));

        Ok(())
    }

    #[test]
    fn missing_context_fails_condition() -> TestResult {
        let basket = Basket::with_items(
            [BasketItem::new(1, 10, Money::from_minor(100, GBP))],
            GBP,
        )?;
        let ctx = PricingContext::new(basket, Catalog::new());

        assert!(!holds(DiscountCondition::DeliveryMethod { methods: vec![3] }, &ctx));
        assert!(!holds(DiscountCondition::PayMethod { methods: vec![5] }, &ctx));
        assert!(!holds(DiscountCondition::Region { regions: vec![9] }, &ctx));

        Ok(())
    }

    #[test]
    fn synergy_and_unhandled_kinds_pass() -> TestResult {
        let ctx = context()?;

        assert!(holds(DiscountCondition::DiscountSynergy { synergy: vec![9] }, &ctx));
        assert!(holds(DiscountCondition::DifferentProductsCount { count: 50 }, &ctx));
        assert!(holds(DiscountCondition::Unrecognized, &ctx));

        Ok(())
    }
}
