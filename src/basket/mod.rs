//! Basket

use rusty_money::{Money, iso::Currency};
use serde::Serialize;
use thiserror::Error;

use crate::{
    catalog::{OfferId, ProductId},
    pricing::{LinePrice, subtotal_minor},
};

/// Basket item identifier
pub type BasketItemId = u64;

/// Bundle identifier
pub type BundleId = u64;

/// Event ticket type identifier
pub type TicketTypeId = u64;

/// Errors related to basket construction.
#[derive(Debug, Error)]
pub enum BasketError {
    /// A line's currency differs from the basket currency.
    ///
    /// Carries the line id, the line currency and the basket currency.
    #[error("Line {0} has currency {1}, but basket has currency {2}")]
    CurrencyMismatch(u64, &'static str, &'static str),
}

/// A purchasable basket line.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketItem<'a> {
    id: BasketItemId,
    offer_id: OfferId,
    product_id: Option<ProductId>,
    bundle_id: Option<BundleId>,
    ticket_type_id: Option<TicketTypeId>,
    qty: u32,
    line: LinePrice<'a>,
}

impl<'a> BasketItem<'a> {
    /// Create a basket line for a single unit of an offer.
    #[must_use]
    pub fn new(id: BasketItemId, offer_id: OfferId, price: Money<'a, Currency>) -> Self {
        Self {
            id,
            offer_id,
            product_id: None,
            bundle_id: None,
            ticket_type_id: None,
            qty: 1,
            line: LinePrice::new(price),
        }
    }

    /// Associate the line with a physical product.
    #[must_use]
    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Mark the line as bought as part of a bundle.
    #[must_use]
    pub fn with_bundle(mut self, bundle_id: BundleId) -> Self {
        self.bundle_id = Some(bundle_id);
        self
    }

    /// Mark the line as an event ticket.
    #[must_use]
    pub fn with_ticket_type(mut self, ticket_type_id: TicketTypeId) -> Self {
        self.ticket_type_id = Some(ticket_type_id);
        self
    }

    /// Set the number of units in the line.
    #[must_use]
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty;
        self
    }

    /// Line id
    pub fn id(&self) -> BasketItemId {
        self.id
    }

    /// Offer bought by this line
    pub fn offer_id(&self) -> OfferId {
        self.offer_id
    }

    /// Product association; `None` marks an event (non-physical) line.
    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    /// Bundle the line was bought in
    pub fn bundle_id(&self) -> Option<BundleId> {
        self.bundle_id
    }

    /// Ticket type for event lines
    pub fn ticket_type_id(&self) -> Option<TicketTypeId> {
        self.ticket_type_id
    }

    /// Units in the line
    pub fn qty(&self) -> u32 {
        self.qty
    }

    /// Current unit price
    pub fn price(&self) -> &Money<'a, Currency> {
        self.line.price()
    }

    /// Original unit price
    pub fn cost(&self) -> &Money<'a, Currency> {
        self.line.cost()
    }

    /// Accumulated unit discount
    pub fn discount(&self) -> Option<&Money<'a, Currency>> {
        self.line.discount()
    }

    /// Price state of the line.
    pub fn line(&self) -> &LinePrice<'a> {
        &self.line
    }

    pub(crate) fn line_mut(&mut self) -> &mut LinePrice<'a> {
        &mut self.line
    }
}

/// Basket lines of one calculation, in insertion order.
#[derive(Debug, Clone)]
pub struct Basket<'a> {
    items: Vec<BasketItem<'a>>,
    currency: &'a Currency,
}

impl<'a> Basket<'a> {
    /// Create an empty basket.
    #[must_use]
    pub fn new(currency: &'a Currency) -> Self {
        Basket {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a basket with the given lines.
    ///
    /// # Errors
    ///
    /// Returns a `BasketError` if a line is priced in another currency.
    pub fn with_items(
        items: impl Into<Vec<BasketItem<'a>>>,
        currency: &'a Currency,
    ) -> Result<Self, BasketError> {
        let items = items.into();

        items.iter().try_for_each(|item| {
            let item_currency = item.price().currency();

            if item_currency == currency {
                Ok(())
            } else {
                Err(BasketError::CurrencyMismatch(
                    item.id(),
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ))
            }
        })?;

        Ok(Basket { items, currency })
    }

    /// Sum of `price × qty` over all lines, in minor units.
    pub fn subtotal_minor(&self) -> i64 {
        subtotal_minor(self.items.iter().map(|item| (item.line(), item.qty())))
    }

    /// Sum of `price × qty` over all lines.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        Money::from_minor(self.subtotal_minor(), self.currency)
    }

    /// Look up a line by id.
    pub fn get(&self, id: BasketItemId) -> Option<&BasketItem<'a>> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Iterate over the lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &BasketItem<'a>> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut BasketItem<'a>> {
        self.items.iter_mut()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the basket has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Basket currency.
    #[must_use]
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Restore every line to its baseline price and re-key the lines by id.
    ///
    /// A later line with an already seen id replaces the earlier one in place.
    pub(crate) fn restore(&mut self) {
        let mut rebuilt: Vec<BasketItem<'a>> = Vec::with_capacity(self.items.len());

        for mut item in self.items.drain(..) {
            item.line.restore();

            match rebuilt.iter_mut().find(|seen| seen.id == item.id) {
                Some(seen) => *seen = item,
                None => rebuilt.push(item),
            }
        }

        self.items = rebuilt;
    }
}

/// Serializable snapshot of a basket line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasketItemSnapshot {
    /// Line id
    pub id: BasketItemId,

    /// Offer id
    pub offer_id: OfferId,

    /// Units in the line
    pub qty: u32,

    /// Original unit price in minor units
    pub cost: i64,

    /// Final unit price in minor units
    pub price: i64,
}

impl From<&BasketItem<'_>> for BasketItemSnapshot {
    fn from(item: &BasketItem<'_>) -> Self {
        Self {
            id: item.id(),
            offer_id: item.offer_id(),
            qty: item.qty(),
            cost: item.cost().to_minor_units(),
            price: item.price().to_minor_units(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{GBP, USD},
    };
    use testresult::TestResult;

    use super::*;

    fn test_items<'a>() -> [BasketItem<'a>; 3] {
        [
            BasketItem::new(1, 10, Money::from_minor(100, GBP)),
            BasketItem::new(2, 20, Money::from_minor(200, GBP)).with_qty(2),
            BasketItem::new(3, 30, Money::from_minor(300, GBP)),
        ]
    }

    #[test]
    fn with_items_currency_mismatch_errors() {
        let items = [
            BasketItem::new(1, 10, Money::from_minor(100, GBP)),
            BasketItem::new(2, 20, Money::from_minor(100, USD)),
        ];

        let result = Basket::with_items(items, GBP);

        assert!(matches!(
            result,
            Err(BasketError::CurrencyMismatch(2, item_currency, basket_currency))
                if item_currency == USD.iso_alpha_code && basket_currency == GBP.iso_alpha_code
        ));
    }

    #[test]
    fn subtotal_counts_quantities() -> TestResult {
        let basket = Basket::with_items(test_items(), GBP)?;

        assert_eq!(basket.subtotal(), Money::from_minor(800, GBP));

        Ok(())
    }

    #[test]
    fn subtotal_with_no_items() {
        let basket = Basket::new(GBP);

        assert_eq!(basket.subtotal_minor(), 0);
        assert!(basket.is_empty());
    }

    #[test]
    fn get_finds_by_id() -> TestResult {
        let basket = Basket::with_items(test_items(), GBP)?;

        assert_eq!(basket.get(2).map(BasketItem::offer_id), Some(20));
        assert!(basket.get(99).is_none());

        Ok(())
    }

    #[test]
    fn restore_resets_prices_and_rekeys_duplicates() -> TestResult {
        let mut basket = Basket::with_items(
            [
                BasketItem::new(1, 10, Money::from_minor(100, GBP)),
                BasketItem::new(2, 20, Money::from_minor(200, GBP)),
                BasketItem::new(1, 11, Money::from_minor(150, GBP)),
            ],
            GBP,
        )?;

        for item in basket.iter_mut() {
            item.line_mut().reduce(50);
        }

        basket.restore();

        let lines: Vec<(u64, u64, i64)> = basket
            .iter()
            .map(|item| (item.id(), item.offer_id(), item.price().to_minor_units()))
            .collect();

        assert_eq!(lines, vec![(1, 11, 150), (2, 20, 200)]);
        assert!(basket.iter().all(|item| item.discount().is_none()));

        Ok(())
    }
}
