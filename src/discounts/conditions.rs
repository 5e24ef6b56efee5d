//! Discount conditions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    basket::BundleId,
    catalog::{BrandId, CategoryId, MerchantId, OfferId},
    context::{CustomerId, PaymentMethodId, RegionId},
    deliveries::DeliveryMethodId,
    discounts::DiscountId,
};

/// Condition kind, as recorded in the applied-discount ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    /// The customer has never ordered before
    FirstOrder,

    /// Minimum order subtotal
    MinPriceOrder,

    /// Minimum subtotal of lines of the given brands
    MinPriceBrand,

    /// Minimum subtotal of lines of the given categories
    MinPriceCategory,

    /// Minimum quantity of an offer
    EveryUnitProduct,

    /// Current delivery uses one of the given methods
    DeliveryMethod,

    /// Payment uses one of the given methods
    PayMethod,

    /// Customer lives in one of the given regions
    Region,

    /// Customer is one of the given customers
    Customer,

    /// The order is the customer's n-th
    OrderSequenceNumber,

    /// A line was bought in one of the given bundles
    Bundle,

    /// Combinability with other discounts
    DiscountSynergy,

    /// Minimum number of distinct products
    DifferentProductsCount,

    /// A line is sold by one of the given merchants
    Merchant,

    /// Unknown condition type
    Unrecognized,
}

/// A condition gating a discount.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountCondition {
    /// The customer has no previous orders.
    FirstOrder,

    /// Basket subtotal is at least `min_price` (major units).
    MinPriceOrder {
        /// Threshold in major units
        min_price: Decimal,
    },

    /// Subtotal of lines whose brand is listed is at least `min_price`.
    MinPriceBrand {
        /// Brands that count towards the threshold
        brands: Vec<BrandId>,

        /// Threshold in major units
        min_price: Decimal,
    },

    /// Subtotal of lines in (or below) a listed category is at least `min_price`.
    MinPriceCategory {
        /// Categories that count towards the threshold
        categories: Vec<CategoryId>,

        /// Threshold in major units
        min_price: Decimal,
    },

    /// The basket holds at least `count` units of `offer`.
    EveryUnitProduct {
        /// Offer id
        offer: OfferId,

        /// Minimum units
        count: u32,
    },

    /// The current delivery uses a listed method.
    DeliveryMethod {
        /// Accepted methods
        methods: Vec<DeliveryMethodId>,
    },

    /// The payment uses a listed method.
    PayMethod {
        /// Accepted methods
        methods: Vec<PaymentMethodId>,
    },

    /// The customer's region is listed.
    Region {
        /// Accepted regions
        regions: Vec<RegionId>,
    },

    /// The customer is listed.
    Customer {
        /// Accepted customers
        customers: Vec<CustomerId>,
    },

    /// This order is the customer's `order_sequence_number`-th.
    OrderSequenceNumber {
        /// One-based order number
        order_sequence_number: u32,
    },

    /// A line was bought in a listed bundle.
    Bundle {
        /// Accepted bundles
        bundles: Vec<BundleId>,
    },

    /// Discounts this one may be combined with on the same line.
    DiscountSynergy {
        /// Combinable discount ids
        #[serde(default)]
        synergy: Vec<DiscountId>,
    },

    /// The basket holds at least `count` distinct products.
    DifferentProductsCount {
        /// Minimum distinct products
        count: u32,
    },

    /// A line is sold by a listed merchant.
    Merchant {
        /// Accepted merchants
        merchants: Vec<MerchantId>,
    },

    /// A condition this engine does not know; never satisfied.
    #[serde(other)]
    Unrecognized,
}

impl DiscountCondition {
    /// Kind of the condition.
    pub fn kind(&self) -> ConditionType {
        match self {
            Self::FirstOrder => ConditionType::FirstOrder,
            Self::MinPriceOrder { .. } => ConditionType::MinPriceOrder,
            Self::MinPriceBrand { .. } => ConditionType::MinPriceBrand,
            Self::MinPriceCategory { .. } => ConditionType::MinPriceCategory,
            Self::EveryUnitProduct { .. } => ConditionType::EveryUnitProduct,
            Self::DeliveryMethod { .. } => ConditionType::DeliveryMethod,
            Self::PayMethod { .. } => ConditionType::PayMethod,
            Self::Region { .. } => ConditionType::Region,
            Self::Customer { .. } => ConditionType::Customer,
            Self::OrderSequenceNumber { .. } => ConditionType::OrderSequenceNumber,
            Self::Bundle { .. } => ConditionType::Bundle,
            Self::DiscountSynergy { .. } => ConditionType::DiscountSynergy,
            Self::DifferentProductsCount { .. } => ConditionType::DifferentProductsCount,
            Self::Merchant { .. } => ConditionType::Merchant,
            Self::Unrecognized => ConditionType::Unrecognized,
        }
    }
}
