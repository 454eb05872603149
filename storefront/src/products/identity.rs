// storefront/src/products/identity.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

const SEPARATOR: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductType {
  Course,
  Module,
}

impl ProductType {
  pub const ALL: [ProductType; 2] = [ProductType::Course, ProductType::Module];

  pub fn as_str(&self) -> &'static str {
    match self {
      ProductType::Course => "Course",
      ProductType::Module => "Module",
    }
  }

  fn prefix(&self) -> String {
    format!("{}{}", self.as_str(), SEPARATOR)
  }
}

impl fmt::Display for ProductType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProductType {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ProductType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| ValidationError::InvalidFormat("Invalid product type".to_string()))
  }
}

/// `"{Type}_{external_pk}"`.
pub fn make_qualified_id(product_type: ProductType, external_pk: &str) -> String {
  format!("{}{}", product_type.prefix(), external_pk)
}

/// Strips the `product_type` prefix off `qualified_id`.
pub fn make_external_pk(product_type: ProductType, qualified_id: &str) -> Result<String, ValidationError> {
  qualified_id
    .strip_prefix(&product_type.prefix())
    .map(str::to_string)
    .ok_or_else(|| ValidationError::InvalidFormat(format!("Invalid qualified id for {}", product_type)))
}

pub fn get_product_type(qualified_id: &str) -> Result<ProductType, ValidationError> {
  ProductType::ALL
    .into_iter()
    .find(|t| qualified_id.starts_with(&t.prefix()))
    .ok_or_else(|| ValidationError::InvalidFormat("Invalid product type".to_string()))
}

/// Splits a qualified id into its type and external pk.
pub fn parse_qualified_id(qualified_id: &str) -> Result<(ProductType, String), ValidationError> {
  let product_type = get_product_type(qualified_id)?;
  let external_pk = make_external_pk(product_type, qualified_id)?;
  Ok((product_type, external_pk))
}
