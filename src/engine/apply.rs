//! Application engine

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, trace};

use crate::{
    appliers::{BasketApplier, DeliveryApplier, DiscountApplier, OfferApplier},
    catalog::{BrandId, CategoryId, Offer, OfferId},
    context::PricingContext,
    deliveries::DeliveryId,
    discounts::{Discount, DiscountError, DiscountType},
    ledger::AppliedDiscount,
};

/// Apply `ordered` candidates to `ctx` in order, then convert fully discounted lines to free.
///
/// # Errors
///
/// Returns a [`DiscountError`] if a discount value cannot be represented in minor units.
pub fn apply(ordered: &[Discount], ctx: &mut PricingContext<'_>) -> Result<(), DiscountError> {
    for discount in ordered {
        apply_discount(discount, ctx)?;
    }

    convert_free_items(ctx);

    Ok(())
}

/// Apply one discount and record it in the ledger.
///
/// Returns `None` when the discount was already applied in this pass.
fn apply_discount<'a>(
    discount: &Discount,
    ctx: &mut PricingContext<'a>,
) -> Result<Option<Money<'a, Currency>>, DiscountError> {
    if ctx.applied.contains(discount.id) {
        debug!(discount = discount.id, "discount already applied");

        return Ok(None);
    }

    let currency = ctx.currency();

    let change = match discount.kind {
        DiscountType::BundleMasterclass => Money::from_minor(0, currency),
        DiscountType::Delivery if ctx.free_delivery => Money::from_minor(0, currency),
        DiscountType::Delivery => apply_to_deliveries(discount, ctx)?,
        DiscountType::CartTotal => BasketApplier.apply(discount, ctx)?,
        DiscountType::Unrecognized => Money::from_minor(0, currency),
        _ => OfferApplier::new(offer_scope(discount, ctx)).apply(discount, ctx)?,
    };

    debug!(
        discount = discount.id,
        kind = ?discount.kind,
        change = change.to_minor_units(),
        "applied discount"
    );

    ctx.applied.insert(AppliedDiscount {
        discount_id: discount.id,
        change,
        conditions: discount.condition_types(),
        summarizable_with_all: discount.summarizable_with_all,
    });

    Ok(Some(change))
}

/// Offers an offer-scoped discount applies to.
pub fn offer_scope(discount: &Discount, ctx: &PricingContext<'_>) -> FxHashSet<OfferId> {
    let excluded_offers: FxHashSet<OfferId> = discount.excluded_offers().collect();

    match discount.kind {
        DiscountType::Offer => discount
            .included_offers()
            .filter(|offer| !excluded_offers.contains(offer))
            .collect(),
        DiscountType::AnyOffer => ctx
            .basket()
            .iter()
            .filter(|item| item.product_id().is_some())
            .map(|item| item.offer_id())
            .filter(|offer| !excluded_offers.contains(offer))
            .collect(),
        DiscountType::BundleOffer | DiscountType::BundleMasterclass => discount
            .bundle_items
            .iter()
            .map(|entry| entry.item_id)
            .collect(),
        DiscountType::AnyBundle => {
            let excluded_bundles: FxHashSet<_> = discount
                .bundles
                .iter()
                .map(|entry| entry.bundle_id)
                .collect();

            ctx.basket()
                .iter()
                .filter(|item| {
                    item.bundle_id()
                        .is_some_and(|bundle| !excluded_bundles.contains(&bundle))
                })
                .map(|item| item.offer_id())
                .collect()
        }
        DiscountType::Brand | DiscountType::AnyBrand => {
            brand_scope(discount, ctx, &excluded_offers)
        }
        DiscountType::Category | DiscountType::AnyCategory => {
            category_scope(discount, ctx, &excluded_offers)
        }
        DiscountType::Masterclass => {
            let ticket_types: FxHashSet<_> = discount
                .public_events
                .iter()
                .map(|entry| entry.ticket_type_id)
                .collect();

            ctx.basket()
                .iter()
                .filter(|item| {
                    item.ticket_type_id()
                        .is_some_and(|ticket_type| ticket_types.contains(&ticket_type))
                })
                .map(|item| item.offer_id())
                .collect()
        }
        DiscountType::AnyMasterclass => ctx
            .basket()
            .iter()
            .filter(|item| item.product_id().is_none())
            .map(|item| item.offer_id())
            .collect(),
        DiscountType::Delivery | DiscountType::CartTotal | DiscountType::Unrecognized => {
            FxHashSet::default()
        }
    }
}

fn brand_scope(
    discount: &Discount,
    ctx: &PricingContext<'_>,
    excluded_offers: &FxHashSet<OfferId>,
) -> FxHashSet<OfferId> {
    let excluded_brands: FxHashSet<BrandId> = discount.excluded_brands().collect();

    let brands: FxHashSet<BrandId> = match discount.kind {
        DiscountType::AnyBrand => ctx.catalog().brand_ids().iter().copied().collect(),
        _ => discount.included_brands().collect(),
    };

    basket_offers(discount, ctx, excluded_offers, |offer| {
        offer
            .brand_id
            .is_some_and(|brand| brands.contains(&brand) && !excluded_brands.contains(&brand))
    })
}

fn category_scope(
    discount: &Discount,
    ctx: &PricingContext<'_>,
    excluded_offers: &FxHashSet<OfferId>,
) -> FxHashSet<OfferId> {
    let excluded_categories: FxHashSet<CategoryId> = discount.excluded_categories().collect();
    let excluded_brands: FxHashSet<BrandId> = discount.excluded_brands().collect();

    let categories: FxHashSet<CategoryId> = match discount.kind {
        DiscountType::AnyCategory => ctx.catalog().category_ids().collect::<FxHashSet<_>>(),
        _ => discount.included_categories().collect(),
    }
    .into_iter()
    .filter(|category| !excluded_categories.contains(category))
    .collect();

    let catalog = ctx.catalog();

    basket_offers(discount, ctx, excluded_offers, |offer| {
        offer.category_id.is_some_and(|category| {
            catalog.descends_from(category, &categories)
                && !catalog.descends_from(category, &excluded_categories)
        }) && offer
            .brand_id
            .is_none_or(|brand| !excluded_brands.contains(&brand))
    })
}

/// Basket offers known to the catalog that match `include`, are not excluded, and belong to the
/// discount's merchant when it has one.
fn basket_offers(
    discount: &Discount,
    ctx: &PricingContext<'_>,
    excluded_offers: &FxHashSet<OfferId>,
    include: impl Fn(&Offer) -> bool,
) -> FxHashSet<OfferId> {
    ctx.basket()
        .iter()
        .filter(|item| !excluded_offers.contains(&item.offer_id()))
        .filter_map(|item| ctx.catalog().offer(item.offer_id()))
        .filter(|offer| {
            discount
                .merchant_id
                .is_none_or(|merchant| offer.merchant_id == Some(merchant))
        })
        .filter(|offer| include(offer))
        .map(|offer| offer.id)
        .collect()
}

/// Apply a delivery discount to every option.
///
/// Each option keeps its own possible discount; only the option matching the current delivery
/// updates the current delivery and contributes the change.
fn apply_to_deliveries<'a>(
    discount: &Discount,
    ctx: &mut PricingContext<'a>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = ctx.currency();
    let current_id = ctx.deliveries.current_id();
    let options: Vec<DeliveryId> = ctx
        .deliveries
        .items()
        .iter()
        .map(|delivery| delivery.id())
        .collect();

    let mut change = Money::from_minor(0, currency);

    for id in options {
        let reduced = DeliveryApplier::new(id).apply(discount, ctx)?;

        if current_id == Some(id) {
            change = reduced;

            if let Some(option) = ctx.deliveries.get(id).cloned() {
                ctx.deliveries.set_current(option);
            }
        }
    }

    Ok(change)
}

/// Zero the price of lines whose only attributions each take the whole cost off.
///
/// Sequential percentage stacking can otherwise leave a residual minor unit on a line that a
/// single full-value discount should have made free.
fn convert_free_items(ctx: &mut PricingContext<'_>) {
    let currency = ctx.currency();

    for item in ctx.basket.iter_mut() {
        let Some(attributions) = ctx.basket_items_by_discounts.get(&item.id()) else {
            continue;
        };

        let cost = item.cost().to_minor_units();
        let (full, other): (Vec<&_>, Vec<&_>) = attributions
            .iter()
            .partition(|attribution| attribution.is_full_value(cost, currency));

        if !full.is_empty() && other.is_empty() {
            item.line_mut().make_free();

            trace!(item = item.id(), "line made free");
        }
    }
}
