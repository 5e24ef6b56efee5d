//! Discount appliers
//!
//! Appliers reduce prices for one resolved scope and report the monetary change they produced.
//! They also keep the per-line attribution map current for every line they touch.

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    basket::BasketItemId,
    context::PricingContext,
    discounts::{Discount, DiscountError},
    ledger::{Attribution, BasketItemsByDiscounts},
};

pub mod basket;
pub mod delivery;
pub mod offers;

pub use basket::BasketApplier;
pub use delivery::DeliveryApplier;
pub use offers::OfferApplier;

/// Applies a discount to one resolved scope of the context.
pub trait DiscountApplier<'a> {
    /// Apply `discount`, returning the total change.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the discount value cannot be represented in minor units.
    fn apply(
        &self,
        discount: &Discount,
        ctx: &mut PricingContext<'a>,
    ) -> Result<Money<'a, Currency>, DiscountError>;
}

/// Whether a line with `attributions` accepts `discount`.
pub(crate) fn accepts(
    discount: &Discount,
    attributions: Option<&SmallVec<[Attribution; 3]>>,
) -> bool {
    attributions.is_none_or(|attributions| {
        discount.combines_with(attributions.iter().map(|attribution| attribution.discount_id))
    })
}

pub(crate) fn attribute(map: &mut BasketItemsByDiscounts, item: BasketItemId, discount: &Discount) {
    let attributions = map.entry(item).or_default();

    if !attributions
        .iter()
        .any(|attribution| attribution.discount_id == discount.id)
    {
        attributions.push(Attribution::of(discount));
    }
}

/// Line total in minor units.
pub(crate) fn line_total(unit_minor: i64, qty: u32) -> i64 {
    unit_minor.saturating_mul(i64::from(qty))
}
