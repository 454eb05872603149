// storefront/src/products/availability.rs

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::identity::{make_qualified_id, ProductType};
use crate::models::{Course, Module};

/// A catalog entry seen as something that could be sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
  /// A course together with all of its modules.
  Course { course: Course, modules: Vec<Module> },
  Module { module: Module },
}

impl Product {
  pub fn product_type(&self) -> ProductType {
    match self {
      Product::Course { .. } => ProductType::Course,
      Product::Module { .. } => ProductType::Module,
    }
  }

  pub fn external_pk(&self) -> &str {
    match self {
      Product::Course { course, .. } => &course.uuid,
      Product::Module { module } => &module.uuid,
    }
  }

  pub fn qualified_id(&self) -> String {
    make_qualified_id(self.product_type(), self.external_pk())
  }

  /// Modules sell when they carry a price, zero included. Courses sell when
  /// they are live and at least one of their modules sells.
  pub fn is_available_to_buy(&self) -> bool {
    match self {
      Product::Module { module } => module_is_available(module),
      Product::Course { course, modules } => course.live && modules.iter().any(module_is_available),
    }
  }

  /// Courses are never priced.
  pub fn price(&self) -> Option<Decimal> {
    match self {
      Product::Module { module } => module.price_without_tax,
      Product::Course { .. } => None,
    }
  }
}

pub fn module_is_available(module: &Module) -> bool {
  module.price_without_tax.is_some()
}

/// Amounts are stored as `NUMERIC(20, 2)`: at most 18 integer digits.
pub fn is_storable_amount(amount: &Decimal) -> bool {
  amount.abs() < Decimal::from(1_000_000_000_000_000_000_i64)
}

/// Whole cents, rounding half a cent away from zero. `None` when the amount
/// has no `i64` cent value.
pub fn to_cents(amount: Decimal) -> Option<i64> {
  amount
    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    .checked_mul(Decimal::ONE_HUNDRED)
    .and_then(|cents| cents.to_i64())
}

/// Cents for a client-supplied float. The value goes through its shortest
/// decimal text so `5114.15` stays `5114.15` rather than `5114.149999…`.
pub fn to_cents_f64(amount: f64) -> Option<i64> {
  if !amount.is_finite() {
    return None;
  }
  amount.to_string().parse::<Decimal>().ok().and_then(to_cents)
}
