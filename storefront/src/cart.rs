// storefront/src/cart.rs

//! Cart validation and order creation.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::catalog::CatalogTx;
use crate::errors::{Result, ValidationError};
use crate::models::{Course, Module, Order, OrderLine};
use crate::products::availability::{is_storable_amount, Product};
use crate::products::identity::{parse_qualified_id, ProductType};

/// A cart entry that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
  pub module: Module,
  pub course: Course,
  pub seats: i32,
}

impl CartLine {
  /// Zero for unpriced modules, which never pass validation anyway. `None`
  /// on overflow.
  pub fn line_total(&self) -> Option<Decimal> {
    self
      .module
      .price_without_tax
      .unwrap_or_default()
      .checked_mul(Decimal::from(self.seats))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
  pub lines: Vec<CartLine>,
  pub subtotal: Decimal,
}

/// A persisted order line with the catalog records it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
  pub line: OrderLine,
  pub module: Module,
  pub course: Course,
}

fn parse_seats(raw: &Value) -> Result<i32, ValidationError> {
  raw
    .as_i64()
    .filter(|n| *n >= 0)
    .and_then(|n| i32::try_from(n).ok())
    .ok_or(ValidationError::InvalidSeatsType)
}

async fn resolve(tx: &mut dyn CatalogTx, qualified_id: &str) -> Result<Product> {
  let (product_type, external_pk) =
    parse_qualified_id(qualified_id).map_err(|_| ValidationError::UnavailableProduct)?;
  let product = match product_type {
    ProductType::Module => tx
      .find_module_by_uuid(&external_pk)
      .await?
      .map(|module| Product::Module { module }),
    ProductType::Course => match tx.find_course_by_uuid(&external_pk).await? {
      Some(course) => {
        let modules = tx.list_modules_for_course(course.id).await?;
        Some(Product::Course { course, modules })
      }
      None => None,
    },
  };
  product.ok_or_else(|| ValidationError::UnavailableProduct.into())
}

/// Checks every cart item against the catalog and prices the cart.
///
/// Items are `{"uuid": <qualified id>, "seats": <int>}`. The first violation
/// is returned and nothing is written. Buying one module of a course means
/// buying all of them.
#[instrument(name = "validate_cart", skip_all, fields(items = items.len()))]
pub async fn validate_cart(tx: &mut dyn CatalogTx, items: &[Value]) -> Result<ValidatedCart> {
  let mut lines: Vec<CartLine> = Vec::with_capacity(items.len());
  let mut seen: HashSet<String> = HashSet::new();
  let mut courses: HashMap<Uuid, Course> = HashMap::new();

  for item in items {
    let fields = item.as_object().ok_or(ValidationError::InvalidPayload)?;
    let qualified_id = match fields.get("uuid") {
      Some(Value::String(s)) => s.clone(),
      Some(_) => return Err(ValidationError::UnavailableProduct.into()),
      None => return Err(ValidationError::MissingKey("uuid".to_string()).into()),
    };
    let raw_seats = fields
      .get("seats")
      .ok_or_else(|| ValidationError::MissingKey("seats".to_string()))?;

    let product = resolve(tx, &qualified_id).await?;
    let seats = parse_seats(raw_seats)?;
    let module = match product {
      Product::Course { .. } => return Err(ValidationError::CannotPurchaseCourse.into()),
      Product::Module { ref module } => {
        if !product.is_available_to_buy() {
          return Err(ValidationError::UnavailableProduct.into());
        }
        module.clone()
      }
    };
    if seats == 0 {
      return Err(ValidationError::ZeroSeats.into());
    }
    if !seen.insert(qualified_id) {
      return Err(ValidationError::DuplicateItem.into());
    }

    let course = match courses.get(&module.course_id) {
      Some(course) => course.clone(),
      None => {
        let course = tx
          .find_course(module.course_id)
          .await?
          .ok_or(ValidationError::UnavailableProduct)?;
        courses.insert(course.id, course.clone());
        course
      }
    };
    lines.push(CartLine { module, course, seats });
  }

  let in_cart: HashSet<&str> = lines.iter().map(|l| l.module.uuid.as_str()).collect();
  for course_id in courses.keys() {
    let siblings = tx.list_modules_for_course(*course_id).await?;
    if siblings.iter().any(|m| !in_cart.contains(m.uuid.as_str())) {
      return Err(ValidationError::IncompleteCourse.into());
    }
  }

  let subtotal = lines
    .iter()
    .try_fold(Decimal::ZERO, |acc, line| line.line_total().and_then(|t| acc.checked_add(t)))
    .filter(is_storable_amount)
    .ok_or(ValidationError::TotalOutOfRange)?;
  debug!(%subtotal, "Cart validated.");
  Ok(ValidatedCart { lines, subtotal })
}

/// Writes the order and one line per cart entry, snapshotting prices.
#[instrument(name = "create_order", skip_all, fields(%purchaser_id))]
pub async fn create_order(
  tx: &mut dyn CatalogTx,
  purchaser_id: Uuid,
  cart: &ValidatedCart,
) -> Result<(Order, Vec<PlacedLine>)> {
  let order = Order::new(purchaser_id, cart.subtotal);
  tx.insert_order(&order).await?;

  let mut placed = Vec::with_capacity(cart.lines.len());
  for entry in &cart.lines {
    let line = OrderLine::new(
      order.id,
      entry.module.id,
      entry.seats,
      entry.module.price_without_tax.unwrap_or_default(),
    );
    tx.insert_order_line(&line).await?;
    placed.push(PlacedLine {
      line,
      module: entry.module.clone(),
      course: entry.course.clone(),
    });
  }
  Ok((order, placed))
}
