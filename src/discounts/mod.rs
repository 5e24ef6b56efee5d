//! Discounts
//!
//! Discount rule definitions, their scopes, and the arithmetic shared by every applier.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::ToPrimitive,
};
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    basket::{BundleId, TicketTypeId},
    catalog::{BrandId, CategoryId, MerchantId, OfferId},
    context::{RoleId, SegmentId},
    discounts::conditions::{ConditionType, DiscountCondition},
};

pub mod conditions;

/// Discount identifier
pub type DiscountId = u64;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A fixed amount does not fit in minor units of the currency.
    #[error("amount {0} cannot be represented in minor units")]
    AmountConversion(Decimal),
}

/// What a discount targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// Named offers
    Offer,

    /// Every product offer in the basket
    AnyOffer,

    /// Offers bought in a bundle
    BundleOffer,

    /// Masterclasses bought in a bundle
    BundleMasterclass,

    /// Every bundled line
    AnyBundle,

    /// Offers of named brands
    Brand,

    /// Offers of every known brand
    AnyBrand,

    /// Offers of named categories
    Category,

    /// Offers of every known category
    AnyCategory,

    /// The delivery price
    Delivery,

    /// The basket total
    CartTotal,

    /// Tickets of named public events
    Masterclass,

    /// Every event ticket
    AnyMasterclass,

    /// A type this engine does not know; never eligible
    #[serde(other)]
    Unrecognized,
}

impl DiscountType {
    /// Bundle discounts are applied before anything else.
    pub fn is_bundle(self) -> bool {
        matches!(self, Self::BundleOffer | Self::BundleMasterclass)
    }
}

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    /// Percentage points of the current price (`100` is everything)
    Percent,

    /// A flat amount in major units of the basket currency
    FixedAmount,
}

/// Lifecycle state of a discount definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountStatus {
    /// Can be applied
    #[default]
    Active,

    /// Temporarily switched off
    Paused,
}

/// Offer scope entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OfferEntry {
    /// Offer id
    pub offer_id: OfferId,

    /// Exclude instead of include
    #[serde(default)]
    pub except: bool,
}

/// Brand scope entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BrandEntry {
    /// Brand id
    pub brand_id: BrandId,

    /// Exclude instead of include
    #[serde(default)]
    pub except: bool,
}

/// Category scope entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CategoryEntry {
    /// Category id
    pub category_id: CategoryId,

    /// Exclude instead of include
    #[serde(default)]
    pub except: bool,
}

/// Bundle excluded from an `ANY_BUNDLE` discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BundleEntry {
    /// Bundle id
    pub bundle_id: BundleId,
}

/// Offer that is part of a bundle discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BundleItemEntry {
    /// Bundle id
    pub bundle_id: BundleId,

    /// Offer id of the bundled item
    pub item_id: OfferId,
}

/// Public event targeted by a masterclass discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PublicEventEntry {
    /// Ticket type sold for the event
    pub ticket_type_id: TicketTypeId,
}

/// A discount rule definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Discount {
    /// Discount id
    pub id: DiscountId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// What the discount targets
    #[serde(rename = "type")]
    pub kind: DiscountType,

    /// Percentage points or flat amount, see `value_type`
    pub value: Decimal,

    /// How `value` is interpreted
    pub value_type: ValueType,

    /// Declared priority flag; ordering does not depend on it
    #[serde(default)]
    pub max_priority: bool,

    /// Only available through a promo code
    #[serde(default)]
    pub promo_code_only: bool,

    /// Combinable with every other discount
    #[serde(default)]
    pub summarizable_with_all: bool,

    /// Merchant the discount belongs to
    #[serde(default)]
    pub merchant_id: Option<MerchantId>,

    /// Lifecycle state
    #[serde(default)]
    pub status: DiscountStatus,

    /// Start of the validity window
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window
    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// Offer scope
    #[serde(default)]
    pub offers: Vec<OfferEntry>,

    /// Brand scope
    #[serde(default)]
    pub brands: Vec<BrandEntry>,

    /// Category scope
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,

    /// Bundle exclusions
    #[serde(default)]
    pub bundles: Vec<BundleEntry>,

    /// Bundled offers
    #[serde(default)]
    pub bundle_items: Vec<BundleItemEntry>,

    /// Public events
    #[serde(default)]
    pub public_events: Vec<PublicEventEntry>,

    /// Customer roles allowed to use the discount; empty allows everyone
    #[serde(default)]
    pub roles: Vec<RoleId>,

    /// Customer segments allowed to use the discount; empty allows everyone
    #[serde(default)]
    pub segments: Vec<SegmentId>,

    /// Conditions gating the discount
    #[serde(default)]
    pub conditions: Vec<DiscountCondition>,
}

impl Discount {
    /// Create an unrestricted, active discount.
    #[must_use]
    pub fn new(id: DiscountId, kind: DiscountType, value_type: ValueType, value: Decimal) -> Self {
        Self {
            id,
            name: String::new(),
            kind,
            value,
            value_type,
            max_priority: false,
            promo_code_only: false,
            summarizable_with_all: false,
            merchant_id: None,
            status: DiscountStatus::Active,
            starts_at: None,
            ends_at: None,
            offers: Vec::new(),
            brands: Vec::new(),
            categories: Vec::new(),
            bundles: Vec::new(),
            bundle_items: Vec::new(),
            public_events: Vec::new(),
            roles: Vec::new(),
            segments: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an offer to the scope.
    #[must_use]
    pub fn with_offer(mut self, offer_id: OfferId) -> Self {
        self.offers.push(OfferEntry {
            offer_id,
            except: false,
        });
        self
    }

    /// Exclude an offer from the scope.
    #[must_use]
    pub fn with_excluded_offer(mut self, offer_id: OfferId) -> Self {
        self.offers.push(OfferEntry {
            offer_id,
            except: true,
        });
        self
    }

    /// Add a brand to the scope.
    #[must_use]
    pub fn with_brand(mut self, brand_id: BrandId) -> Self {
        self.brands.push(BrandEntry {
            brand_id,
            except: false,
        });
        self
    }

    /// Exclude a brand from the scope.
    #[must_use]
    pub fn with_excluded_brand(mut self, brand_id: BrandId) -> Self {
        self.brands.push(BrandEntry {
            brand_id,
            except: true,
        });
        self
    }

    /// Add a category to the scope.
    #[must_use]
    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.categories.push(CategoryEntry {
            category_id,
            except: false,
        });
        self
    }

    /// Exclude a category from the scope.
    #[must_use]
    pub fn with_excluded_category(mut self, category_id: CategoryId) -> Self {
        self.categories.push(CategoryEntry {
            category_id,
            except: true,
        });
        self
    }

    /// Exclude a bundle from an `ANY_BUNDLE` discount.
    #[must_use]
    pub fn with_excluded_bundle(mut self, bundle_id: BundleId) -> Self {
        self.bundles.push(BundleEntry { bundle_id });
        self
    }

    /// Add a bundled offer.
    #[must_use]
    pub fn with_bundle_item(mut self, bundle_id: BundleId, item_id: OfferId) -> Self {
        self.bundle_items.push(BundleItemEntry { bundle_id, item_id });
        self
    }

    /// Add a public event by its ticket type.
    #[must_use]
    pub fn with_public_event(mut self, ticket_type_id: TicketTypeId) -> Self {
        self.public_events.push(PublicEventEntry { ticket_type_id });
        self
    }

    /// Restrict the discount to a customer role.
    #[must_use]
    pub fn with_role(mut self, role: RoleId) -> Self {
        self.roles.push(role);
        self
    }

    /// Restrict the discount to a customer segment.
    #[must_use]
    pub fn with_segment(mut self, segment: SegmentId) -> Self {
        self.segments.push(segment);
        self
    }

    /// Add a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: DiscountCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Restrict the discount to a merchant.
    #[must_use]
    pub fn with_merchant(mut self, merchant_id: MerchantId) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    /// Make the discount combinable with all others.
    #[must_use]
    pub fn summarizable_with_all(mut self) -> Self {
        self.summarizable_with_all = true;
        self
    }

    /// Make the discount available through a promo code only.
    #[must_use]
    pub fn promo_code_only(mut self) -> Self {
        self.promo_code_only = true;
        self
    }

    /// Limit the discount to a validity window.
    #[must_use]
    pub fn active_between(
        mut self,
        starts_at: Option<Timestamp>,
        ends_at: Option<Timestamp>,
    ) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    /// Whether the discount is switched on and inside its validity window at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status == DiscountStatus::Active
            && self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| now <= end)
    }

    /// Offers explicitly included in the scope.
    pub fn included_offers(&self) -> impl Iterator<Item = OfferId> + '_ {
        self.offers
            .iter()
            .filter(|entry| !entry.except)
            .map(|entry| entry.offer_id)
    }

    /// Offers excluded from the scope.
    pub fn excluded_offers(&self) -> impl Iterator<Item = OfferId> + '_ {
        self.offers
            .iter()
            .filter(|entry| entry.except)
            .map(|entry| entry.offer_id)
    }

    /// Brands explicitly included in the scope.
    pub fn included_brands(&self) -> impl Iterator<Item = BrandId> + '_ {
        self.brands
            .iter()
            .filter(|entry| !entry.except)
            .map(|entry| entry.brand_id)
    }

    /// Brands excluded from the scope.
    pub fn excluded_brands(&self) -> impl Iterator<Item = BrandId> + '_ {
        self.brands
            .iter()
            .filter(|entry| entry.except)
            .map(|entry| entry.brand_id)
    }

    /// Categories explicitly included in the scope.
    pub fn included_categories(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.categories
            .iter()
            .filter(|entry| !entry.except)
            .map(|entry| entry.category_id)
    }

    /// Categories excluded from the scope.
    pub fn excluded_categories(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.categories
            .iter()
            .filter(|entry| entry.except)
            .map(|entry| entry.category_id)
    }

    /// Types of the attached conditions, in declaration order.
    pub fn condition_types(&self) -> SmallVec<[ConditionType; 4]> {
        self.conditions.iter().map(DiscountCondition::kind).collect()
    }

    /// Whether a condition other than `DISCOUNT_SYNERGY` gates the discount.
    pub fn has_gating_conditions(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.kind() != ConditionType::DiscountSynergy)
    }

    /// Discounts this one is declared combinable with.
    pub fn synergy(&self) -> &[DiscountId] {
        self.conditions
            .iter()
            .find_map(|condition| match condition {
                DiscountCondition::DiscountSynergy { synergy } => Some(synergy.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Append `id` to the synergy condition, creating the condition if absent.
    pub fn add_synergy(&mut self, id: DiscountId) {
        let existing = self.conditions.iter_mut().find_map(|condition| match condition {
            DiscountCondition::DiscountSynergy { synergy } => Some(synergy),
            _ => None,
        });

        match existing {
            Some(synergy) => synergy.push(id),
            None => self
                .conditions
                .push(DiscountCondition::DiscountSynergy { synergy: vec![id] }),
        }
    }

    /// Whether a line already carrying `existing` discounts accepts this one.
    pub fn combines_with(&self, existing: impl IntoIterator<Item = DiscountId>) -> bool {
        if self.summarizable_with_all {
            return true;
        }

        let synergy = self.synergy();

        existing.into_iter().all(|id| synergy.contains(&id))
    }

    /// Unit reduction for a line currently priced at `price_minor`, clamped to the price.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented in minor units.
    pub fn reduction_minor(
        &self,
        price_minor: i64,
        currency: &Currency,
    ) -> Result<i64, DiscountError> {
        if price_minor <= 0 {
            return Ok(0);
        }

        let reduction = match self.value_type {
            ValueType::Percent => {
                let percent = Percentage::from(self.value / Decimal::ONE_HUNDRED);

                percent_of_minor(&percent, price_minor)?
            }
            ValueType::FixedAmount => minor_units(self.value, currency)?,
        };

        Ok(reduction.clamp(0, price_minor))
    }
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns `DiscountError::PercentConversion` if the percentage calculation overflows or cannot be
/// safely represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    // decimal_percentage doesn't expose the underlying Decimal
    ((*percent) * Decimal::ONE)
        .checked_mul(Decimal::from(minor))
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Convert an amount in major units to minor units of `currency`.
///
/// # Errors
///
/// Returns `DiscountError::AmountConversion` if the amount does not fit in an `i64`.
pub fn minor_units(amount: Decimal, currency: &Currency) -> Result<i64, DiscountError> {
    let scale = 10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .ok_or(DiscountError::AmountConversion(amount))?;

    amount
        .checked_mul(scale)
        .ok_or(DiscountError::AmountConversion(amount))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::AmountConversion(amount))
}
