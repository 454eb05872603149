// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{debug, instrument};

use crate::catalog::CatalogTx;
use crate::errors::AppError;
use crate::products::availability::module_is_available;
use crate::products::identity::{parse_qualified_id, ProductType};
use crate::products::{Product, ProductView};
use crate::state::AppState;

async fn load_product(tx: &mut dyn CatalogTx, qualified_id: &str) -> Result<Option<ProductView>, AppError> {
  let Ok((product_type, external_pk)) = parse_qualified_id(qualified_id) else {
    return Ok(None);
  };

  match product_type {
    ProductType::Course => {
      let Some(course) = tx.find_course_by_uuid(&external_pk).await? else {
        return Ok(None);
      };
      let modules = tx.list_modules_for_course(course.id).await?;
      let product = Product::Course { course, modules };
      Ok(product.is_available_to_buy().then(|| ProductView::from_product(&product)))
    }
    ProductType::Module => {
      let Some(module) = tx.find_module_by_uuid(&external_pk).await? else {
        return Ok(None);
      };
      if !module_is_available(&module) {
        return Ok(None);
      }
      let course = tx.find_course(module.course_id).await?;
      Ok(course.map(|course| ProductView::from_module_in_course(&module, &course)))
    }
  }
}

/// Available courses in creation order, each with its available modules.
#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let mut tx = app_state.catalog.begin().await?;
  let mut views = Vec::new();
  for course in tx.list_courses().await? {
    let modules = tx.list_modules_for_course(course.id).await?;
    let product = Product::Course { course, modules };
    if product.is_available_to_buy() {
      views.push(ProductView::from_product(&product));
    }
  }
  debug!(count = views.len(), "Listed products.");
  Ok(HttpResponse::Ok().json(views))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let qualified_id = path.into_inner();
  let mut tx = app_state.catalog.begin().await?;
  match load_product(tx.as_mut(), &qualified_id).await? {
    Some(view) => Ok(HttpResponse::Ok().json(view)),
    None => Err(AppError::NotFound("Not found.".to_string())),
  }
}
