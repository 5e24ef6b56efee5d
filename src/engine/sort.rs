//! Priority sorter

use crate::{
    context::PricingContext,
    discounts::{Discount, DiscountType, ValueType},
};

/// Order candidates for application.
///
/// Candidates are bucketed as bundle, promo code, catalog, promo-code-only, conditioned, cart
/// total, then delivery discounts, with fixed amounts after percentages inside each bucket. The
/// bucketed list is then stable-sorted by `value`, highest first, which only preserves bucket
/// order between discounts of equal value.
pub fn sort(mut candidates: Vec<Discount>, ctx: &PricingContext<'_>) -> Vec<Discount> {
    candidates.sort_by_key(|discount| discount.value_type == ValueType::FixedAmount);

    let (promo_code, rest) = match ctx.promo_code_discount() {
        Some(id) => split(candidates, |discount| discount.id == id),
        None => (Vec::new(), candidates),
    };

    let (delivery, rest) = split(rest, |discount| discount.kind == DiscountType::Delivery);
    let (promo_code_only, rest) = split(rest, |discount| discount.promo_code_only);
    let (bundle, rest) = split(rest, |discount| discount.kind.is_bundle());
    let (cart_total, rest) = split(rest, |discount| discount.kind == DiscountType::CartTotal);
    let (conditioned, catalog) = split(rest, Discount::has_gating_conditions);

    let mut ordered: Vec<Discount> = [
        bundle,
        promo_code,
        catalog,
        promo_code_only,
        conditioned,
        cart_total,
        delivery,
    ]
    .into_iter()
    .flatten()
    .collect();

    ordered.sort_by(|a, b| b.value.cmp(&a.value));

    ordered
}

fn split(
    discounts: Vec<Discount>,
    predicate: impl Fn(&Discount) -> bool,
) -> (Vec<Discount>, Vec<Discount>) {
    discounts.into_iter().partition(|discount| predicate(discount))
}
