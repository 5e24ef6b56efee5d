//! Delivery applier

use rusty_money::{Money, iso::Currency};
use tracing::trace;

use crate::{
    appliers::DiscountApplier,
    context::PricingContext,
    deliveries::DeliveryId,
    discounts::{Discount, DiscountError},
};

/// Reduces the price of one delivery option.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryApplier {
    delivery_id: DeliveryId,
}

impl DeliveryApplier {
    /// Create an applier for the option `delivery_id`.
    pub fn new(delivery_id: DeliveryId) -> Self {
        Self { delivery_id }
    }
}

impl<'a> DiscountApplier<'a> for DeliveryApplier {
    fn apply(
        &self,
        discount: &Discount,
        ctx: &mut PricingContext<'a>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let currency = ctx.currency();

        let Some(delivery) = ctx.deliveries.get_mut(self.delivery_id) else {
            return Ok(Money::from_minor(0, currency));
        };

        if !discount.combines_with(delivery.applied_discounts().iter().copied()) {
            trace!(
                discount = discount.id,
                delivery = self.delivery_id,
                "delivery refuses discount"
            );

            return Ok(Money::from_minor(0, currency));
        }

        let reduction = discount.reduction_minor(delivery.price().to_minor_units(), currency)?;
        let applied = delivery.reduce(discount.id, reduction);

        trace!(
            discount = discount.id,
            delivery = self.delivery_id,
            reduction = applied,
            "reduced delivery"
        );

        Ok(Money::from_minor(applied, currency))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;
    use crate::{
        basket::Basket,
        catalog::Catalog,
        deliveries::{Deliveries, Delivery},
        discounts::{DiscountType, ValueType},
    };

    fn context<'a>() -> Result<PricingContext<'a>, Box<dyn std::error::Error>> {
        let ctx = PricingContext::new(Basket::new(GBP), Catalog::new()).with_deliveries(
            Deliveries::new([
                Delivery::new(1, Money::from_minor(500, GBP)).selected(),
                Delivery::new(2, Money::from_minor(800, GBP)),
            ]),
        )?;

        Ok(ctx)
    }

    #[test]
    fn reduces_only_the_named_option() -> TestResult {
        let mut ctx = context()?;
        let discount = Discount::new(
            1,
            DiscountType::Delivery,
            ValueType::Percent,
            Decimal::from(50),
        );

        let change = DeliveryApplier::new(2).apply(&discount, &mut ctx)?;

        assert_eq!(change, Money::from_minor(400, GBP));
        assert_eq!(
            ctx.deliveries().get(2).map(|delivery| delivery.price().to_minor_units()),
            Some(400)
        );
        assert_eq!(
            ctx.deliveries().get(1).map(|delivery| delivery.price().to_minor_units()),
            Some(500)
        );

        Ok(())
    }

    #[test]
    fn unknown_option_changes_nothing() -> TestResult {
        let mut ctx = context()?;
        let discount = Discount::new(
            1,
            DiscountType::Delivery,
            ValueType::Percent,
            Decimal::from(50),
        );

        let change = DeliveryApplier::new(9).apply(&discount, &mut ctx)?;

        assert_eq!(change, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn second_discount_needs_synergy() -> TestResult {
        let mut ctx = context()?;
        let first = Discount::new(1, DiscountType::Delivery, ValueType::FixedAmount, Decimal::ONE);
        let second = Discount::new(2, DiscountType::Delivery, ValueType::FixedAmount, Decimal::ONE);

        DeliveryApplier::new(1).apply(&first, &mut ctx)?;
        let change = DeliveryApplier::new(1).apply(&second, &mut ctx)?;

        assert_eq!(change, Money::from_minor(0, GBP));
        assert_eq!(
            ctx.deliveries().get(1).map(|delivery| delivery.price().to_minor_units()),
            Some(400)
        );

        Ok(())
    }
}
