//! Product catalog route handlers.
//!
//! Reads go through the catalog client's cache. They work for anonymous
//! visitors; a logged-in visitor's token is forwarded when present.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bazaar_core::{CatalogEntity, CatalogEntityId, Product, ProductFilter, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Listing query string. `category` and `brand` are comma-separated ids.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_rating: Option<String>,
}

impl ProductsQuery {
    /// Convert into a catalog filter.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` naming the first malformed parameter.
    pub fn into_filter(self) -> Result<ProductFilter> {
        Ok(ProductFilter {
            name: self.name.filter(|n| !n.trim().is_empty()),
            category: parse_ids("category", self.category.as_deref())?,
            brand: parse_ids("brand", self.brand.as_deref())?,
            min_price: parse_opt("min_price", self.min_price.as_deref())?,
            max_price: parse_opt("max_price", self.max_price.as_deref())?,
            min_rating: parse_opt("min_rating", self.min_rating.as_deref())?,
        })
    }
}

fn parse_ids(field: &str, raw: Option<&str>) -> Result<Vec<CatalogEntityId>> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid {field}: {s}")))
        })
        .collect()
}

fn parse_opt(field: &str, raw: Option<&str>) -> Result<Option<Decimal>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Decimal::from_str(s)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {field}: {s}"))),
    }
}

/// Product listing, filtered when any criterion is given.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = query.into_filter()?;
    let products = state.catalog().filter(&auth.ctx, &filter).await?;
    Ok(Json(products))
}

#[instrument(skip(state, auth))]
pub async fn categories(
    State(state): State<AppState>,
    auth: OptionalAuth,
) -> Result<Json<Vec<CatalogEntity>>> {
    Ok(Json(state.catalog().categories(&auth.ctx).await?))
}

#[instrument(skip(state, auth))]
pub async fn deals(
    State(state): State<AppState>,
    auth: OptionalAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().deals(&auth.ctx).await?))
}

#[instrument(skip(state, auth))]
pub async fn offers(
    State(state): State<AppState>,
    auth: OptionalAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().offers(&auth.ctx).await?))
}

#[instrument(skip(state, auth))]
pub async fn featured(
    State(state): State<AppState>,
    auth: OptionalAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().featured(&auth.ctx).await?))
}

/// Product detail.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().product(&auth.ctx, id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter_splits_ids() {
        let query = ProductsQuery {
            name: Some("  ".to_string()),
            category: Some("3, 7,".to_string()),
            brand: Some("12".to_string()),
            min_price: Some("100".to_string()),
            max_price: Some(String::new()),
            min_rating: None,
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.name, None);
        assert_eq!(
            filter.category,
            vec![CatalogEntityId::new(3), CatalogEntityId::new(7)]
        );
        assert_eq!(filter.brand, vec![CatalogEntityId::new(12)]);
        assert_eq!(filter.min_price, Some(Decimal::from(100)));
        assert_eq!(filter.max_price, None);
    }

    #[test]
    fn test_query_rejects_bad_ids() {
        let query = ProductsQuery {
            category: Some("shoes".to_string()),
            ..ProductsQuery::default()
        };
        let err = query.into_filter().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("category")));
    }

    #[test]
    fn test_empty_query_is_empty_filter() {
        assert!(ProductsQuery::default().into_filter().unwrap().is_empty());
    }
}
