//! Discount sources

use std::convert::Infallible;

use rustc_hash::FxHashSet;

use crate::{catalog::MerchantId, context::PricingContext, discounts::Discount};

/// Supplies the discount definitions active for a calculation.
pub trait DiscountSource {
    /// Error returned when discounts cannot be fetched.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the discounts that may apply to `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the discounts cannot be retrieved.
    fn fetch(&self, ctx: &PricingContext<'_>) -> Result<Vec<Discount>, Self::Error>;
}

/// Discount definitions held in memory.
///
/// Returns the discounts that are active at `ctx.now()`, belong to a merchant present in the
/// basket (when they name one), and are either generally available or attached to the active
/// promo code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiscountSource {
    discounts: Vec<Discount>,
}

impl InMemoryDiscountSource {
    /// Create a source over `discounts`.
    pub fn new(discounts: impl Into<Vec<Discount>>) -> Self {
        Self {
            discounts: discounts.into(),
        }
    }
}

impl DiscountSource for InMemoryDiscountSource {
    type Error = Infallible;

    fn fetch(&self, ctx: &PricingContext<'_>) -> Result<Vec<Discount>, Self::Error> {
        let merchants: FxHashSet<MerchantId> = ctx
            .basket()
            .iter()
            .filter_map(|item| ctx.catalog().offer(item.offer_id()))
            .filter_map(|offer| offer.merchant_id)
            .collect();

        let now = ctx.now();
        let promo_code_discount = ctx.promo_code_discount();

        Ok(self
            .discounts
            .iter()
            .filter(|discount| discount.is_active_at(now))
            .filter(|discount| {
                discount
                    .merchant_id
                    .is_none_or(|merchant| merchants.contains(&merchant))
            })
            .filter(|discount| {
                !discount.promo_code_only || promo_code_discount == Some(discount.id)
            })
            .cloned()
            .collect())
    }
}
