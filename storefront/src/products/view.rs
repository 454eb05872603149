// storefront/src/products/view.rs

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use super::availability::{module_is_available, Product};
use super::identity::{make_qualified_id, ProductType};
use crate::models::{Course, Module};

/// JSON shape of the product read API.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
  pub upc: String,
  pub title: String,
  pub description: String,
  pub external_pk: String,
  pub product_type: String,
  #[serde(with = "rust_decimal::serde::float_option")]
  pub price_without_tax: Option<Decimal>,
  pub parent_upc: Option<String>,
  pub info: Value,
  /// Only sub-products that are themselves available.
  pub children: Vec<ProductView>,
}

impl ProductView {
  pub fn from_product(product: &Product) -> Self {
    match product {
      Product::Course { course, modules } => Self::course(course, modules),
      Product::Module { module } => Self::module(module, None),
    }
  }

  fn course(course: &Course, modules: &[Module]) -> Self {
    let upc = make_qualified_id(ProductType::Course, &course.uuid);
    let children = modules
      .iter()
      .filter(|m| module_is_available(m))
      .map(|m| Self::module(m, Some(upc.clone())))
      .collect();

    Self {
      upc,
      title: course.title.clone(),
      description: course.description.clone(),
      external_pk: course.uuid.clone(),
      product_type: ProductType::Course.to_string(),
      price_without_tax: None,
      parent_upc: None,
      info: json!({
        "author_name": course.author_name,
        "overview": course.overview,
        "image_url": course.image_url,
        "instructors": course.instructors,
        "course_id": course.course_id,
        "live": course.live,
      }),
      children,
    }
  }

  fn module(module: &Module, parent_upc: Option<String>) -> Self {
    Self {
      upc: make_qualified_id(ProductType::Module, &module.uuid),
      title: module.title.clone(),
      description: String::new(),
      external_pk: module.uuid.clone(),
      product_type: ProductType::Module.to_string(),
      price_without_tax: module.price_without_tax,
      parent_upc,
      info: json!({
        "locator_id": module.locator_id,
        "subchapters": module.subchapters,
        "order": module.order,
      }),
      children: Vec::new(),
    }
  }

  /// Same as [`ProductView::from_product`] for a module whose course is known.
  pub fn from_module_in_course(module: &Module, course: &Course) -> Self {
    Self::module(module, Some(make_qualified_id(ProductType::Course, &course.uuid)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::course::CourseFields;
  use std::str::FromStr;
  use uuid::Uuid;

  #[test]
  fn course_view_lists_only_priced_modules_and_prices_as_numbers() {
    let mut course = Course::new(
      "c1".into(),
      Uuid::new_v4(),
      CourseFields {
        title: "Circuits".into(),
        instructors: vec!["Ada".into()],
        ..Default::default()
      },
    );
    course.live = true;
    let mut priced = Module::new("m1".into(), course.id, "Intro".into(), 0);
    priced.price_without_tax = Some(Decimal::from_str("25.50").unwrap());
    let unpriced = Module::new("m2".into(), course.id, "Later".into(), 1);

    let view = ProductView::from_product(&Product::Course {
      course,
      modules: vec![priced, unpriced],
    });
    let body = serde_json::to_value(&view).unwrap();

    assert_eq!(body["upc"], "Course_c1");
    assert_eq!(body["product_type"], "Course");
    assert_eq!(body["price_without_tax"], Value::Null);
    assert_eq!(body["info"]["instructors"], json!(["Ada"]));
    assert_eq!(body["children"].as_array().unwrap().len(), 1);
    assert_eq!(body["children"][0]["upc"], "Module_m1");
    assert_eq!(body["children"][0]["parent_upc"], "Course_c1");
    assert_eq!(body["children"][0]["price_without_tax"], json!(25.5));
  }
}
