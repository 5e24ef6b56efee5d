//! Pricing context
//!
//! Everything one calculation reads and mutates: the basket, delivery options, catalog and
//! customer data, and the engine's running ledger.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    basket::{Basket, BasketError},
    catalog::Catalog,
    deliveries::{Deliveries, DeliveryId},
    discounts::DiscountId,
    ledger::{AppliedDiscounts, BasketItemsByDiscounts},
};

/// Customer identifier
pub type CustomerId = u64;

/// Customer role identifier
pub type RoleId = u64;

/// Customer segment identifier
pub type SegmentId = u64;

/// Region identifier
pub type RegionId = u64;

/// Payment method identifier
pub type PaymentMethodId = u64;

/// The customer placing the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Customer {
    /// Customer id
    #[serde(default)]
    pub id: Option<CustomerId>,

    /// Roles held by the customer
    #[serde(default)]
    pub roles: Vec<RoleId>,

    /// Marketing segment
    #[serde(default)]
    pub segment: Option<SegmentId>,

    /// Delivery region
    #[serde(default)]
    pub region: Option<RegionId>,

    /// Completed orders before this one
    #[serde(default)]
    pub orders_count: u32,
}

/// Payment state of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Payment {
    /// Whether discounts must be (re)calculated
    #[serde(default = "default_need_calculate")]
    pub need_calculate: bool,

    /// Chosen payment method
    #[serde(default)]
    pub method: Option<PaymentMethodId>,
}

fn default_need_calculate() -> bool {
    true
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            need_calculate: true,
            method: None,
        }
    }
}

/// Price a delivery option would have had with delivery discounts applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PossibleDeliveryDiscount<'a> {
    /// Delivery option id
    pub delivery_id: DeliveryId,

    /// Original price of the option
    pub cost: Money<'a, Currency>,

    /// Price after the trial pass
    pub price: Money<'a, Currency>,
}

/// Input and mutable state of one discount calculation.
#[derive(Debug, Clone)]
pub struct PricingContext<'a> {
    pub(crate) basket: Basket<'a>,
    pub(crate) deliveries: Deliveries<'a>,
    pub(crate) catalog: Catalog,
    pub(crate) customer: Customer,
    pub(crate) payment: Payment,
    pub(crate) promo_code_discount: Option<DiscountId>,
    pub(crate) free_delivery: bool,
    pub(crate) now: Timestamp,
    pub(crate) applied: AppliedDiscounts<'a>,
    pub(crate) basket_items_by_discounts: BasketItemsByDiscounts,
    pub(crate) possible_delivery_discounts: Vec<PossibleDeliveryDiscount<'a>>,
}

impl<'a> PricingContext<'a> {
    /// Create a context for `basket`, evaluated at the current instant.
    #[must_use]
    pub fn new(basket: Basket<'a>, catalog: Catalog) -> Self {
        Self {
            basket,
            deliveries: Deliveries::default(),
            catalog,
            customer: Customer::default(),
            payment: Payment::default(),
            promo_code_discount: None,
            free_delivery: false,
            now: Timestamp::now(),
            applied: AppliedDiscounts::default(),
            basket_items_by_discounts: BasketItemsByDiscounts::default(),
            possible_delivery_discounts: Vec::new(),
        }
    }

    /// Attach the delivery options.
    ///
    /// # Errors
    ///
    /// Returns a `BasketError` if an option is priced in another currency than the basket.
    pub fn with_deliveries(mut self, deliveries: Deliveries<'a>) -> Result<Self, BasketError> {
        let currency = self.basket.currency();

        if let Some(mismatch) = deliveries
            .items()
            .iter()
            .find(|delivery| delivery.price().currency() != currency)
        {
            return Err(BasketError::CurrencyMismatch(
                mismatch.id(),
                mismatch.price().currency().iso_alpha_code,
                currency.iso_alpha_code,
            ));
        }

        self.deliveries = deliveries;

        Ok(self)
    }

    /// Set the customer.
    #[must_use]
    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = customer;
        self
    }

    /// Set the payment state.
    #[must_use]
    pub fn with_payment(mut self, payment: Payment) -> Self {
        self.payment = payment;
        self
    }

    /// Set the discount attached to the active promo code.
    #[must_use]
    pub fn with_promo_code_discount(mut self, discount: DiscountId) -> Self {
        self.promo_code_discount = Some(discount);
        self
    }

    /// Mark delivery as already free through another mechanism.
    #[must_use]
    pub fn with_free_delivery(mut self, free_delivery: bool) -> Self {
        self.free_delivery = free_delivery;
        self
    }

    /// Evaluate discount validity windows at `now`.
    #[must_use]
    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }

    /// Basket lines
    pub fn basket(&self) -> &Basket<'a> {
        &self.basket
    }

    /// Delivery options
    pub fn deliveries(&self) -> &Deliveries<'a> {
        &self.deliveries
    }

    /// Catalog master data
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Customer placing the order
    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    /// Payment state
    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    /// Discount attached to the active promo code
    pub fn promo_code_discount(&self) -> Option<DiscountId> {
        self.promo_code_discount
    }

    /// Whether delivery is already free
    pub fn free_delivery(&self) -> bool {
        self.free_delivery
    }

    /// Instant discounts are evaluated at
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Context currency
    pub fn currency(&self) -> &'a Currency {
        self.basket.currency()
    }

    /// Discounts applied so far
    pub fn applied(&self) -> &AppliedDiscounts<'a> {
        &self.applied
    }

    /// Discounts attributed to each basket line
    pub fn basket_items_by_discounts(&self) -> &BasketItemsByDiscounts {
        &self.basket_items_by_discounts
    }

    /// Delivery prices captured during the last trial pass
    pub fn possible_delivery_discounts(&self) -> &[PossibleDeliveryDiscount<'a>] {
        &self.possible_delivery_discounts
    }
}
