//! Checkout Fixtures
//!
//! YAML description of one checkout: catalog, customer, basket, delivery options and the discount
//! definitions available to it.

use std::str::FromStr;

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;

use crate::{
    basket::{BasketItem, BasketItemId, BundleId, TicketTypeId},
    catalog::{BrandId, Catalog, Category, Offer, OfferId, ProductId},
    context::{Customer, Payment},
    deliveries::{Delivery, DeliveryId, DeliveryMethodId},
    discounts::{Discount, DiscountId, minor_units},
    fixtures::FixtureError,
};

/// Top-level checkout fixture from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutFixture {
    /// ISO currency code every price must use
    pub currency: String,

    /// Instant the checkout is evaluated at; defaults to now
    #[serde(default)]
    pub now: Option<Timestamp>,

    /// Catalog master data
    #[serde(default)]
    pub catalog: CatalogFixture,

    /// Customer placing the order
    #[serde(default)]
    pub customer: Customer,

    /// Payment state
    #[serde(default)]
    pub payment: Payment,

    /// Discount attached to the entered promo code
    #[serde(default)]
    pub promo_code_discount: Option<DiscountId>,

    /// Delivery is already free through another mechanism
    #[serde(default)]
    pub free_delivery: bool,

    /// Basket lines
    #[serde(default)]
    pub basket: Vec<BasketItemFixture>,

    /// Delivery options
    #[serde(default)]
    pub deliveries: Vec<DeliveryFixture>,

    /// Discount definitions
    #[serde(default)]
    pub discounts: Vec<Discount>,
}

/// Catalog section of a checkout fixture.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFixture {
    /// Known brands
    #[serde(default)]
    pub brands: Vec<BrandId>,

    /// Category tree nodes
    #[serde(default)]
    pub categories: Vec<Category>,

    /// Offers
    #[serde(default)]
    pub offers: Vec<Offer>,
}

impl From<&CatalogFixture> for Catalog {
    fn from(fixture: &CatalogFixture) -> Self {
        let mut catalog = Catalog::new();

        fixture
            .brands
            .iter()
            .for_each(|brand| catalog.insert_brand(*brand));

        fixture
            .categories
            .iter()
            .for_each(|category| catalog.insert_category(*category));

        fixture
            .offers
            .iter()
            .for_each(|offer| catalog.insert_offer(offer.clone()));

        catalog
    }
}

/// A basket line from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct BasketItemFixture {
    /// Line id
    pub id: BasketItemId,

    /// Offer id
    pub offer_id: OfferId,

    /// Unit price string (e.g., "2.50 GBP")
    pub price: String,

    /// Units
    #[serde(default = "default_qty")]
    pub qty: u32,

    /// Product association, absent for event tickets
    #[serde(default)]
    pub product_id: Option<ProductId>,

    /// Bundle the line was bought in
    #[serde(default)]
    pub bundle_id: Option<BundleId>,

    /// Ticket type for event lines
    #[serde(default)]
    pub ticket_type_id: Option<TicketTypeId>,
}

fn default_qty() -> u32 {
    1
}

impl BasketItemFixture {
    /// Build the basket line.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the price cannot be parsed.
    pub fn try_into_item(&self) -> Result<BasketItem<'static>, FixtureError> {
        let (minor, currency) = parse_price(&self.price)?;

        let mut item = BasketItem::new(self.id, self.offer_id, Money::from_minor(minor, currency))
            .with_qty(self.qty);

        if let Some(product) = self.product_id {
            item = item.with_product(product);
        }

        if let Some(bundle) = self.bundle_id {
            item = item.with_bundle(bundle);
        }

        if let Some(ticket_type) = self.ticket_type_id {
            item = item.with_ticket_type(ticket_type);
        }

        Ok(item)
    }
}

/// A delivery option from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryFixture {
    /// Delivery id
    pub id: DeliveryId,

    /// Price string (e.g., "3.99 GBP")
    pub price: String,

    /// Delivery method
    #[serde(default)]
    pub method: Option<DeliveryMethodId>,

    /// The customer's choice
    #[serde(default)]
    pub selected: bool,
}

impl DeliveryFixture {
    /// Build the delivery option.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the price cannot be parsed.
    pub fn try_into_delivery(&self) -> Result<Delivery<'static>, FixtureError> {
        let (minor, currency) = parse_price(&self.price)?;

        let mut delivery = Delivery::new(self.id, Money::from_minor(minor, currency));

        if let Some(method) = self.method {
            delivery = delivery.with_method(method);
        }

        if self.selected {
            delivery = delivery.selected();
        }

        Ok(delivery)
    }
}

/// Parse a price string such as `"2.50 GBP"` into minor units and its currency.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPrice`] if the string is malformed or the amount does not fit
/// in minor units, and [`FixtureError::UnknownCurrency`] for unknown ISO codes.
pub fn parse_price(price: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = price.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(price.to_string()));
    };

    let currency = iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    let amount =
        Decimal::from_str(amount).map_err(|_err| FixtureError::InvalidPrice(price.to_string()))?;

    let minor = minor_units(amount, currency)
        .map_err(|_err| FixtureError::InvalidPrice(price.to_string()))?;

    Ok((minor, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, JPY};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        assert_eq!(parse_price("2.50 GBP")?, (250, GBP));
        assert_eq!(parse_price("1200 JPY")?, (1200, JPY));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_input() {
        assert!(matches!(parse_price("2.50"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("abc GBP"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(
            parse_price("2.50 GBP extra"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("2.50 ZZZ"),
            Err(FixtureError::UnknownCurrency(code)) if code == "ZZZ"
        ));
    }

    #[test]
    fn basket_item_fixture_defaults_to_one_unit() -> TestResult {
        let fixture: BasketItemFixture = serde_norway::from_str(
            r#"
id: 1
offer_id: 10
price: "4.00 GBP"
bundle_id: 3
"#,
        )?;

        let item = fixture.try_into_item()?;

        assert_eq!(item.qty(), 1);
        assert_eq!(item.bundle_id(), Some(3));
        assert_eq!(item.price(), &Money::from_minor(400, GBP));

        Ok(())
    }
}
