//! Condition checkers
//!
//! A discount passes eligibility only when every checker accepts it. Each checker evaluates the
//! condition kinds it handles and ignores the rest.

use crate::{
    context::PricingContext,
    discounts::{
        Discount,
        conditions::{ConditionType, DiscountCondition},
    },
};

pub mod conditions;
pub mod different_products;

pub use conditions::DiscountConditionChecker;
pub use different_products::DifferentProductsCountChecker;

/// Condition kinds the checkers evaluate. Anything else attached to a discount is ignored.
pub const CHECKING_CONDITIONS: [ConditionType; 14] = [
    ConditionType::FirstOrder,
    ConditionType::MinPriceOrder,
    ConditionType::MinPriceBrand,
    ConditionType::MinPriceCategory,
    ConditionType::EveryUnitProduct,
    ConditionType::DeliveryMethod,
    ConditionType::PayMethod,
    ConditionType::Region,
    ConditionType::Customer,
    ConditionType::OrderSequenceNumber,
    ConditionType::Bundle,
    ConditionType::DiscountSynergy,
    ConditionType::DifferentProductsCount,
    ConditionType::Merchant,
];

/// Evaluates discount conditions against a pricing context.
pub trait ConditionChecker {
    /// Whether this checker is responsible for conditions of `kind`.
    fn handles(&self, kind: ConditionType) -> bool;

    /// Whether a single condition holds.
    fn evaluate(&self, condition: &DiscountCondition, ctx: &PricingContext<'_>) -> bool;

    /// Whether every condition of `discount` this checker handles holds.
    fn check(&self, discount: &Discount, ctx: &PricingContext<'_>) -> bool {
        discount
            .conditions
            .iter()
            .filter(|condition| {
                let kind = condition.kind();

                CHECKING_CONDITIONS.contains(&kind) && self.handles(kind)
            })
            .all(|condition| self.evaluate(condition, ctx))
    }
}

/// Whether every built-in checker accepts `discount`.
pub fn passes_all(discount: &Discount, ctx: &PricingContext<'_>) -> bool {
    DiscountConditionChecker.check(discount, ctx)
        && DifferentProductsCountChecker.check(discount, ctx)
}
