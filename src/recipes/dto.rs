use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItemOut;
use crate::error::ApiError;

/// Compact recipe shape used by list, create and update responses:
/// association fields are bare ID arrays.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minute: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
    pub image: Option<String>,
}

/// Expanded recipe shape used by single-item detail: associations embedded
/// as full sub-objects.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub time_minute: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<CatalogItemOut>,
    pub ingredients: Vec<CatalogItemOut>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minute: i32,
    pub price: Decimal,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub ingredients: Vec<i64>,
}

/// PATCH body; PUT reuses it but requires the core fields to be present.
#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub time_minute: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// Query parameters for recipe listing: comma-separated ID lists.
#[derive(Debug, Deserialize)]
pub struct RecipeListParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Parse a comma-separated ID list; any malformed token is a validation
/// error on the given field.
pub fn parse_id_list(raw: &str, field: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::field(field, format!("invalid id: {:?}", token.trim())))
        })
        .collect()
}

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::field("title", "this field may not be blank"));
    }
    Ok(())
}

pub fn validate_time_minute(time_minute: i32) -> Result<(), ApiError> {
    if time_minute < 1 {
        return Err(ApiError::field(
            "time_minute",
            "ensure this value is greater than or equal to 1",
        ));
    }
    Ok(())
}

/// Price is NUMERIC(5, 2): at most 5 digits total, 2 of them fractional.
pub fn validate_price(price: Decimal) -> Result<(), ApiError> {
    let scale = price.scale();
    if scale > 2 {
        return Err(ApiError::field(
            "price",
            "ensure that there are no more than 2 decimal places",
        ));
    }
    let digits = price.mantissa().unsigned_abs().to_string().len() as u32;
    if digits.saturating_sub(scale) > 3 {
        return Err(ApiError::field(
            "price",
            "ensure that there are no more than 5 digits in total",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn id_list_parses_valid_tokens() {
        assert_eq!(parse_id_list("1,2,3", "tags").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list(" 7 , 9 ", "tags").unwrap(), vec![7, 9]);
    }

    #[test]
    fn id_list_rejects_malformed_tokens() {
        assert!(parse_id_list("1,abc", "tags").is_err());
        assert!(parse_id_list("", "tags").is_err());
        assert!(parse_id_list("1,,2", "ingredients").is_err());
        assert!(parse_id_list("1.5", "ingredients").is_err());
    }

    #[test]
    fn price_accepts_in_range_values() {
        assert!(validate_price(dec("2.50")).is_ok());
        assert!(validate_price(dec("123.45")).is_ok());
        assert!(validate_price(dec("999")).is_ok());
        assert!(validate_price(dec("0.05")).is_ok());
    }

    #[test]
    fn price_rejects_too_many_decimal_places() {
        assert!(validate_price(dec("1.234")).is_err());
    }

    #[test]
    fn price_rejects_too_many_digits() {
        assert!(validate_price(dec("1234.50")).is_err());
        assert!(validate_price(dec("123456")).is_err());
    }

    #[test]
    fn time_minute_must_be_positive() {
        assert!(validate_time_minute(1).is_ok());
        assert!(validate_time_minute(0).is_err());
        assert!(validate_time_minute(-5).is_err());
    }

    #[test]
    fn title_must_not_be_blank() {
        assert!(validate_title("Tea").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("").is_err());
    }

    #[test]
    fn summary_uses_bare_ids_and_detail_embeds_objects() {
        let summary = RecipeSummary {
            id: 1,
            title: "Tea".into(),
            time_minute: 5,
            price: dec("2.50"),
            link: String::new(),
            tags: vec![3],
            ingredients: vec![],
            image: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["tags"], serde_json::json!([3]));

        let detail = RecipeDetail {
            id: 1,
            title: "Tea".into(),
            time_minute: 5,
            price: dec("2.50"),
            link: String::new(),
            tags: vec![CatalogItemOut {
                id: 3,
                name: "Breakfast".into(),
            }],
            ingredients: vec![],
            image: None,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            json["tags"],
            serde_json::json!([{"id": 3, "name": "Breakfast"}])
        );
        assert_eq!(json["ingredients"], serde_json::json!([]));
    }
}
