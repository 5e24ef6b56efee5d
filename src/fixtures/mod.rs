//! Fixtures

use std::{fs, path::PathBuf};

use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::{
    basket::{Basket, BasketError},
    catalog::Catalog,
    context::PricingContext,
    deliveries::Deliveries,
    fixtures::checkouts::CheckoutFixture,
    source::InMemoryDiscountSource,
};

pub mod checkouts;

pub use checkouts::parse_price;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// No checkout loaded yet
    #[error("No checkout loaded")]
    NoCheckout,

    /// Basket or delivery creation error
    #[error("Failed to create basket: {0}")]
    Basket(#[from] BasketError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    checkout: Option<CheckoutFixture>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            checkout: None,
        }
    }

    /// Load a checkout from `checkouts/<name>.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_checkout(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self
            .base_path
            .join("checkouts")
            .join(format!("{name}.yml"));

        let contents = fs::read_to_string(&file_path)?;

        self.checkout = Some(serde_norway::from_str(&contents)?);

        Ok(self)
    }

    /// Load a complete fixture set from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_checkout(name)?;

        Ok(fixture)
    }

    /// The loaded checkout
    ///
    /// # Errors
    ///
    /// Returns an error if no checkout has been loaded.
    pub fn checkout(&self) -> Result<&CheckoutFixture, FixtureError> {
        self.checkout.as_ref().ok_or(FixtureError::NoCheckout)
    }

    /// Currency of the loaded checkout
    ///
    /// # Errors
    ///
    /// Returns an error if no checkout is loaded or its currency is unknown.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        let code = &self.checkout()?.currency;

        iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.clone()))
    }

    /// Build a pricing context for the loaded checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if no checkout is loaded, a price cannot be parsed, or a line or delivery
    /// is priced in another currency than the checkout.
    pub fn pricing_context(&self) -> Result<PricingContext<'static>, FixtureError> {
        let currency = self.currency()?;
        let checkout = self.checkout()?;

        let items = checkout
            .basket
            .iter()
            .map(checkouts::BasketItemFixture::try_into_item)
            .collect::<Result<Vec<_>, _>>()?;

        let deliveries = checkout
            .deliveries
            .iter()
            .map(checkouts::DeliveryFixture::try_into_delivery)
            .collect::<Result<Vec<_>, _>>()?;

        let basket = Basket::with_items(items, currency)?;

        let mut ctx = PricingContext::new(basket, Catalog::from(&checkout.catalog))
            .with_deliveries(Deliveries::new(deliveries))?
            .with_customer(checkout.customer.clone())
            .with_payment(checkout.payment)
            .with_free_delivery(checkout.free_delivery);

        if let Some(promo) = checkout.promo_code_discount {
            ctx = ctx.with_promo_code_discount(promo);
        }

        if let Some(now) = checkout.now {
            ctx = ctx.at(now);
        }

        Ok(ctx)
    }

    /// Discount source over the loaded checkout's discount definitions
    ///
    /// # Errors
    ///
    /// Returns an error if no checkout has been loaded.
    pub fn discount_source(&self) -> Result<InMemoryDiscountSource, FixtureError> {
        Ok(InMemoryDiscountSource::new(
            self.checkout()?.discounts.clone(),
        ))
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
