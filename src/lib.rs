//! Cascade
//!
//! Cascade is a sequential discount resolution engine. Given a basket, the delivery options, the
//! customer and a set of discount rules it decides which discounts apply, orders them, applies
//! them one after another to line and delivery prices, and reports what was applied.
//!
//! The entry point is [`engine::DiscountCalculator`], which fetches candidate rules from a
//! [`source::DiscountSource`] and mutates a [`context::PricingContext`] in place.

pub mod appliers;
pub mod basket;
pub mod catalog;
pub mod checkers;
pub mod context;
pub mod deliveries;
pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod ledger;
pub mod output;
pub mod pricing;
pub mod source;
pub mod utils;
