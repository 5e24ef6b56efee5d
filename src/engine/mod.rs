//! Discount engine
//!
//! Runs the filter, sort and apply pipeline over a [`PricingContext`], with a trial pass over the
//! delivery options first so each option can report its possible discount.

use thiserror::Error;
use tracing::{Span, info};

use crate::{
    context::{PossibleDeliveryDiscount, PricingContext},
    discounts::{Discount, DiscountError},
    output::{AppliedDiscountsReport, DiscountOutput},
    source::DiscountSource,
};

pub mod apply;
pub mod filter;
pub mod rollback;
pub mod sort;

/// Errors raised by a calculation.
#[derive(Debug, Error)]
pub enum CalculatorError {
    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// The discount source failed.
    #[error("failed to fetch discounts: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Resolves and applies discounts for pricing contexts.
#[derive(Debug, Clone)]
pub struct DiscountCalculator<S> {
    source: S,
}

impl<S: DiscountSource> DiscountCalculator<S> {
    /// Create a calculator fetching discounts from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Calculate discounts for `ctx`, leaving the discounted state in it.
    ///
    /// Returns `Ok(None)` without touching the context when the payment says no calculation is
    /// needed. Running it again on the same context recomputes from the baseline prices.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculatorError`] if the discount source fails or a discount value cannot be
    /// represented in minor units.
    #[tracing::instrument(
        name = "discounts.calculate",
        skip_all,
        fields(
            candidate_count = tracing::field::Empty,
            applied_count = tracing::field::Empty
        ),
        err
    )]
    pub fn calculate(
        &self,
        ctx: &mut PricingContext<'_>,
    ) -> Result<Option<AppliedDiscountsReport>, CalculatorError> {
        if !ctx.payment().need_calculate {
            info!("calculation not needed");

            return Ok(None);
        }

        rollback::rollback(ctx);
        ctx.possible_delivery_discounts.clear();

        let discounts = self
            .source
            .fetch(ctx)
            .map_err(|error| CalculatorError::Source(Box::new(error)))?;

        if !ctx.deliveries.is_empty() {
            if !ctx.free_delivery {
                run_pass(&discounts, ctx)?;
                capture_possible_delivery_discounts(ctx);
                rollback::rollback(ctx);
            }

            ctx.deliveries.select_current();
        }

        let candidate_count = run_pass(&discounts, ctx)?;

        // Options other than the current one only carry possible discounts.
        ctx.deliveries.restore_alternatives();

        let report = DiscountOutput::new(&discounts).finish(ctx);

        let span = Span::current();

        span.record("candidate_count", tracing::field::display(candidate_count));
        span.record(
            "applied_count",
            tracing::field::display(report.discounts.len()),
        );

        info!(
            total_change = report.total_change,
            "calculated discounts"
        );

        Ok(Some(report))
    }

    /// Undo every discount applied to `ctx`.
    pub fn force_rollback(&self, ctx: &mut PricingContext<'_>) {
        rollback::rollback(ctx);
    }
}

/// One filter, sort, apply pass. Returns the number of candidates.
fn run_pass(discounts: &[Discount], ctx: &mut PricingContext<'_>) -> Result<usize, DiscountError> {
    let candidates = filter::filter(discounts, ctx);
    let candidate_count = candidates.len();
    let ordered = sort::sort(candidates, ctx);

    apply::apply(&ordered, ctx)?;

    Ok(candidate_count)
}

fn capture_possible_delivery_discounts(ctx: &mut PricingContext<'_>) {
    ctx.possible_delivery_discounts = ctx
        .deliveries
        .items()
        .iter()
        .map(|delivery| PossibleDeliveryDiscount {
            delivery_id: delivery.id(),
            cost: *delivery.cost(),
            price: *delivery.price(),
        })
        .collect();
}
