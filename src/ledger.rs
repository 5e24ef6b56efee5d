//! Ledger
//!
//! Running record of what the engine applied during one calculation.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    basket::BasketItemId,
    discounts::{Discount, DiscountId, ValueType, conditions::ConditionType, minor_units},
};

/// A discount the engine applied, with the total change it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount<'a> {
    /// Discount id
    pub discount_id: DiscountId,

    /// Total reduction, `Σ unit reduction × qty`
    pub change: Money<'a, Currency>,

    /// Types of the conditions the discount carried
    pub conditions: SmallVec<[ConditionType; 4]>,

    /// Whether the discount was combinable with all others
    pub summarizable_with_all: bool,
}

/// Applied discounts keyed by id, in application order.
#[derive(Debug, Clone, Default)]
pub struct AppliedDiscounts<'a> {
    entries: Vec<AppliedDiscount<'a>>,
    index: FxHashMap<DiscountId, usize>,
}

impl<'a> AppliedDiscounts<'a> {
    /// Record an entry unless the discount is already present.
    ///
    /// Returns `false` when an entry for the id already existed.
    pub fn insert(&mut self, entry: AppliedDiscount<'a>) -> bool {
        if self.index.contains_key(&entry.discount_id) {
            return false;
        }

        self.index.insert(entry.discount_id, self.entries.len());
        self.entries.push(entry);

        true
    }

    /// Whether the discount has an entry.
    pub fn contains(&self, id: DiscountId) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up an entry by discount id.
    pub fn get(&self, id: DiscountId) -> Option<&AppliedDiscount<'a>> {
        self.index.get(&id).and_then(|&position| self.entries.get(position))
    }

    /// Iterate entries in application order.
    pub fn iter(&self) -> impl Iterator<Item = &AppliedDiscount<'a>> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was applied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Keep only the entries matching `keep`, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&AppliedDiscount<'a>) -> bool) {
        self.entries.retain(keep);
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.discount_id, position))
            .collect();
    }
}

/// A discount recorded against a basket line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribution {
    /// Discount id
    pub discount_id: DiscountId,

    /// Discount value, see `value_type`
    pub value: Decimal,

    /// How `value` is interpreted
    pub value_type: ValueType,
}

impl Attribution {
    /// Attribution of `discount`.
    pub fn of(discount: &Discount) -> Self {
        Self {
            discount_id: discount.id,
            value: discount.value,
            value_type: discount.value_type,
        }
    }

    /// Whether this discount alone takes the whole `cost_minor` off the line.
    pub fn is_full_value(&self, cost_minor: i64, currency: &Currency) -> bool {
        match self.value_type {
            ValueType::Percent => self.value == Decimal::ONE_HUNDRED,
            ValueType::FixedAmount => {
                minor_units(self.value, currency).is_ok_and(|value| value == cost_minor)
            }
        }
    }
}

/// Discounts attributed to each basket line.
pub type BasketItemsByDiscounts = FxHashMap<BasketItemId, SmallVec<[Attribution; 3]>>;
