//! Eligibility filter

use tracing::debug;

use crate::{
    checkers,
    context::PricingContext,
    discounts::{Discount, DiscountType},
};

/// Discounts that may be applied to `ctx`, with synergy conditions synthesized.
///
/// The returned discounts are copies; synthesized synergy never leaks back into `discounts`.
pub fn filter(discounts: &[Discount], ctx: &PricingContext<'_>) -> Vec<Discount> {
    let mut candidates: Vec<Discount> = discounts
        .iter()
        .filter(|discount| {
            let eligible = is_applicable(discount, ctx)
                && role_matches(discount, ctx)
                && segment_matches(discount, ctx);

            if !eligible {
                debug!(discount = discount.id, kind = ?discount.kind, "discount not applicable");
            }

            eligible
        })
        .filter(|discount| {
            let passes = discount.conditions.is_empty() || checkers::passes_all(discount, ctx);

            if !passes {
                debug!(discount = discount.id, "discount conditions not met");
            }

            passes
        })
        .cloned()
        .collect();

    synthesize_synergy(&mut candidates);

    candidates
}

/// Type-specific applicability: whether the discount has something to work with.
pub fn is_applicable(discount: &Discount, ctx: &PricingContext<'_>) -> bool {
    match discount.kind {
        DiscountType::Offer => discount.included_offers().next().is_some(),
        DiscountType::BundleOffer | DiscountType::BundleMasterclass => {
            !discount.bundle_items.is_empty()
        }
        DiscountType::Brand => discount.included_brands().next().is_some(),
        DiscountType::Category => !discount.categories.is_empty(),
        DiscountType::Delivery => ctx.deliveries().current().is_some() && !ctx.free_delivery(),
        DiscountType::Masterclass => ctx.basket().iter().any(|item| {
            discount
                .public_events
                .iter()
                .any(|event| item.ticket_type_id() == Some(event.ticket_type_id))
        }),
        DiscountType::CartTotal
        | DiscountType::AnyOffer
        | DiscountType::AnyBundle
        | DiscountType::AnyBrand
        | DiscountType::AnyCategory
        | DiscountType::AnyMasterclass => !ctx.basket().is_empty(),
        DiscountType::Unrecognized => false,
    }
}

fn role_matches(discount: &Discount, ctx: &PricingContext<'_>) -> bool {
    discount.roles.is_empty()
        || discount
            .roles
            .iter()
            .any(|role| ctx.customer().roles.contains(role))
}

fn segment_matches(discount: &Discount, ctx: &PricingContext<'_>) -> bool {
    discount.segments.is_empty()
        || ctx
            .customer()
            .segment
            .is_some_and(|segment| discount.segments.contains(&segment))
}

/// Make every `summarizable_with_all` candidate combinable with all other candidates.
fn synthesize_synergy(candidates: &mut [Discount]) {
    let summarizable: Vec<_> = candidates
        .iter()
        .filter(|discount| discount.summarizable_with_all)
        .map(|discount| discount.id)
        .collect();

    if summarizable.is_empty() {
        return;
    }

    for discount in candidates
        .iter_mut()
        .filter(|discount| !discount.summarizable_with_all)
    {
        for &id in &summarizable {
            discount.add_synergy(id);
        }
    }
}
