//! Deliveries

use rusty_money::{Money, iso::Currency};
use serde::Serialize;
use smallvec::SmallVec;

use crate::{discounts::DiscountId, pricing::LinePrice};

/// Delivery option identifier
pub type DeliveryId = u64;

/// Delivery method identifier
pub type DeliveryMethodId = u64;

/// A delivery option offered at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<'a> {
    id: DeliveryId,
    method: Option<DeliveryMethodId>,
    selected: bool,
    line: LinePrice<'a>,
    applied: SmallVec<[DiscountId; 2]>,
}

impl<'a> Delivery<'a> {
    /// Create an unselected delivery option.
    #[must_use]
    pub fn new(id: DeliveryId, price: Money<'a, Currency>) -> Self {
        Self {
            id,
            method: None,
            selected: false,
            line: LinePrice::new(price),
            applied: SmallVec::new(),
        }
    }

    /// Set the delivery method.
    #[must_use]
    pub fn with_method(mut self, method: DeliveryMethodId) -> Self {
        self.method = Some(method);
        self
    }

    /// Mark the option as the customer's choice.
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Delivery id
    pub fn id(&self) -> DeliveryId {
        self.id
    }

    /// Delivery method
    pub fn method(&self) -> Option<DeliveryMethodId> {
        self.method
    }

    /// Whether the customer selected this option.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Current price
    pub fn price(&self) -> &Money<'a, Currency> {
        self.line.price()
    }

    /// Original price
    pub fn cost(&self) -> &Money<'a, Currency> {
        self.line.cost()
    }

    /// Accumulated discount
    pub fn discount(&self) -> Option<&Money<'a, Currency>> {
        self.line.discount()
    }

    /// Delivery discounts already applied to this option.
    pub fn applied_discounts(&self) -> &[DiscountId] {
        &self.applied
    }

    pub(crate) fn reduce(&mut self, discount: DiscountId, reduction_minor: i64) -> i64 {
        let applied = self.line.reduce(reduction_minor);

        if applied > 0 {
            self.applied.push(discount);
        }

        applied
    }

    pub(crate) fn restore(&mut self) {
        self.line.restore();
        self.applied.clear();
    }
}

/// Delivery options and the customer's current choice.
///
/// `current` is a copy of the selected option that discount application updates; the options
/// themselves only carry possible discounts.
#[derive(Debug, Clone, Default)]
pub struct Deliveries<'a> {
    items: Vec<Delivery<'a>>,
    current: Option<Delivery<'a>>,
}

impl<'a> Deliveries<'a> {
    /// Create the delivery set, taking the selected option as current.
    #[must_use]
    pub fn new(items: impl Into<Vec<Delivery<'a>>>) -> Self {
        let mut deliveries = Self {
            items: items.into(),
            current: None,
        };

        deliveries.select_current();

        deliveries
    }

    /// Delivery options in order.
    pub fn items(&self) -> &[Delivery<'a>] {
        &self.items
    }

    /// Whether there are no delivery options.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The delivery currently chosen for the order.
    pub fn current(&self) -> Option<&Delivery<'a>> {
        self.current.as_ref()
    }

    /// Id of the current delivery.
    pub fn current_id(&self) -> Option<DeliveryId> {
        self.current.as_ref().map(Delivery::id)
    }

    /// Look up an option by id.
    pub fn get(&self, id: DeliveryId) -> Option<&Delivery<'a>> {
        self.items.iter().find(|delivery| delivery.id() == id)
    }

    /// Reset `current` to a copy of the selected option.
    pub fn select_current(&mut self) {
        self.current = self
            .items
            .iter()
            .find(|delivery| delivery.is_selected())
            .cloned();
    }

    pub(crate) fn get_mut(&mut self, id: DeliveryId) -> Option<&mut Delivery<'a>> {
        self.items.iter_mut().find(|delivery| delivery.id() == id)
    }

    pub(crate) fn set_current(&mut self, delivery: Delivery<'a>) {
        self.current = Some(delivery);
    }

    /// Restore every option except the current one to its baseline.
    pub(crate) fn restore_alternatives(&mut self) {
        let current = self.current_id();

        self.items
            .iter_mut()
            .filter(|delivery| Some(delivery.id) != current)
            .for_each(Delivery::restore);
    }

    /// Restore every option to its baseline and re-key the options by id.
    ///
    /// The current delivery is re-synced with its restored option when it still exists.
    pub(crate) fn restore(&mut self) {
        let mut rebuilt: Vec<Delivery<'a>> = Vec::with_capacity(self.items.len());

        for mut delivery in self.items.drain(..) {
            delivery.restore();

            match rebuilt.iter_mut().find(|seen| seen.id == delivery.id) {
                Some(seen) => *seen = delivery,
                None => rebuilt.push(delivery),
            }
        }

        self.items = rebuilt;

        if let Some(current) = self.current.as_mut() {
            match self.items.iter().find(|delivery| delivery.id == current.id) {
                Some(restored) => *current = restored.clone(),
                None => current.restore(),
            }
        }
    }
}

/// Serializable snapshot of a delivery option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliverySnapshot {
    /// Delivery id
    pub id: DeliveryId,

    /// Original price in minor units
    pub cost: i64,

    /// Price after discounts in minor units
    pub price: i64,

    /// Whether the customer selected this option
    pub selected: bool,
}

impl From<&Delivery<'_>> for DeliverySnapshot {
    fn from(delivery: &Delivery<'_>) -> Self {
        Self {
            id: delivery.id(),
            cost: delivery.cost().to_minor_units(),
            price: delivery.price().to_minor_units(),
            selected: delivery.is_selected(),
        }
    }
}
