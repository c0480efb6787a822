use shared::{ProductRecord, RecommendationResult, SkinType};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogSchema, SchemaError};

pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecommendError {
    #[error("Catalog schema error: {0}")]
    Schema(#[from] SchemaError),
}

fn cell<'a>(row: &'a [String], index: Option<usize>) -> &'a str {
    index
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// Parses numbers the way spreadsheets export them: `"4.5"`, `"$12.00"`,
/// `"1,234"`.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '€' | '£'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn to_product(row: &[String], schema: &CatalogSchema) -> ProductRecord {
    ProductRecord {
        code: cell(row, schema.code).to_string(),
        name: cell(row, schema.name).to_string(),
        brand: cell(row, schema.brand).to_string(),
        price: parse_number(cell(row, schema.price)),
        rating: parse_number(cell(row, schema.rating)),
        skin_type_tags: cell(row, Some(schema.skin_type)).to_string(),
        website_url: cell(row, schema.url).to_string(),
    }
}

/// Rows tagged for `label`, best rated first, at most `limit` long.
///
/// Rated rows sort by descending rating; unrated rows follow in catalog
/// order. Equal ratings keep catalog order. An empty catalog yields an empty
/// result rather than a schema error.
pub fn recommend(
    catalog: &Catalog,
    label: SkinType,
    limit: usize,
) -> Result<RecommendationResult, RecommendError> {
    if catalog.is_empty() {
        return Ok(RecommendationResult::empty(label));
    }

    let schema = catalog.schema()?;
    let mut matches: Vec<ProductRecord> = catalog
        .rows()
        .iter()
        .filter(|row| label.matches_tag(cell(row, Some(schema.skin_type))))
        .map(|row| to_product(row, &schema))
        .collect();

    if schema.rating.is_some() {
        // sort_by is stable, so ties stay in catalog order
        matches.sort_by(|a, b| match (a.rating, b.rating) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    let matched = matches.len();
    matches.truncate(limit);
    log::debug!(
        "{} of {} catalog rows match {}, returning {}",
        matched,
        catalog.len(),
        label,
        matches.len()
    );

    Ok(RecommendationResult {
        label,
        matched,
        products: matches,
    })
}

/// Catalog handle plus the configured result cap.
#[derive(Debug, Clone)]
pub struct ProductRecommender {
    catalog: Arc<Catalog>,
    limit: usize,
}

impl ProductRecommender {
    pub fn new(catalog: Arc<Catalog>, limit: usize) -> Self {
        Self { catalog, limit }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn recommend(
        &self,
        label: SkinType,
        limit: Option<usize>,
    ) -> Result<RecommendationResult, RecommendError> {
        recommend(&self.catalog, label, limit.unwrap_or(self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(columns: &[&str], rows: &[&[&str]]) -> Catalog {
        Catalog::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_compound_tags_sorted_by_rating() {
        let catalog = catalog(
            &["Code", "Name", "Skin_Type", "Rating"],
            &[
                &["A1", "Gel Cleanser", "Oily", "4.2"],
                &["B2", "Clay Mask", "oily, combination", "4.8"],
            ],
        );
        let result = recommend(&catalog, SkinType::Oily, 5).unwrap();
        assert_eq!(result.matched, 2);
        let codes: Vec<&str> = result.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["B2", "A1"]);
        assert_eq!(result.products[0].rating, Some(4.8));
    }

    #[test]
    fn test_every_row_matches_and_limit_respected() {
        let rows: Vec<Vec<String>> = (0..20)
            .map(|i| {
                let tag = if i % 3 == 0 { "Dry" } else { "OILY" };
                vec![format!("P{}", i), tag.to_string(), format!("{}", i % 5)]
            })
            .collect();
        let catalog = Catalog::new(
            vec!["code".into(), "skin type".into(), "rating".into()],
            rows,
        );

        for limit in [0, 1, 5, 50] {
            let result = recommend(&catalog, SkinType::Oily, limit).unwrap();
            assert!(result.products.len() <= limit);
            assert_eq!(result.matched, 13);
            for product in &result.products {
                assert!(SkinType::Oily.matches_tag(&product.skin_type_tags));
            }
        }
    }

    #[test]
    fn test_ties_and_unrated_keep_catalog_order() {
        let catalog = catalog(
            &["Code", "Skin Type", "Review Score"],
            &[
                &["a", "Dry", ""],
                &["b", "Dry", "4.0"],
                &["c", "Dry", "n/a"],
                &["d", "Dry", "4.0"],
                &["e", "Dry", "4.5"],
            ],
        );
        let result = recommend(&catalog, SkinType::Dry, 5).unwrap();
        let codes: Vec<&str> = result.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["e", "b", "d", "a", "c"]);
    }

    #[test]
    fn test_no_rating_column_keeps_catalog_order() {
        let catalog = catalog(
            &["Name", "skin_type"],
            &[&["z", "normal"], &["y", "Normal"], &["x", "dry"]],
        );
        let result = recommend(&catalog, SkinType::Normal, 5).unwrap();
        let names: Vec<&str> = result.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["z", "y"]);
        assert!(result.products.iter().all(|p| p.rating.is_none()));
    }

    #[test]
    fn test_empty_catalog_is_empty_result() {
        let result = recommend(&Catalog::default(), SkinType::Dry, 5).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.matched, 0);
    }

    #[test]
    fn test_no_matches_is_empty_result() {
        let catalog = catalog(&["Skin Type"], &[&["Oily"], &["Dry"]]);
        let result = recommend(&catalog, SkinType::Sensitive, 5).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_missing_skin_column_is_schema_error() {
        let catalog = catalog(&["Name", "Rating"], &[&["Serum", "4.1"]]);
        assert!(matches!(
            recommend(&catalog, SkinType::Dry, 5),
            Err(RecommendError::Schema(SchemaError::MissingSkinType(_)))
        ));
    }

    #[test]
    fn test_duplicate_codes_tolerated() {
        let catalog = catalog(
            &["Code", "Skin Type"],
            &[&["X", "Dry"], &["X", "dry"]],
        );
        let result = recommend(&catalog, SkinType::Dry, 5).unwrap();
        assert_eq!(result.products.len(), 2);
    }

    #[test]
    fn test_product_projection() {
        let catalog = catalog(
            &["Product Code", "Product Name", "Brand", "Price", "Skin_Type", "Rating", "URL"],
            &[&["C9", "Toner", "Acme", "$1,299.50", "Dry", "4.9", "https://example.com/c9"]],
        );
        let product = recommend(&catalog, SkinType::Dry, 5).unwrap().products.remove(0);
        assert_eq!(
            product,
            ProductRecord {
                code: "C9".into(),
                name: "Toner".into(),
                brand: "Acme".into(),
                price: Some(1299.5),
                rating: Some(4.9),
                skin_type_tags: "Dry".into(),
                website_url: "https://example.com/c9".into(),
            }
        );
    }

    #[test]
    fn test_recommender_uses_default_limit() {
        let rows: Vec<Vec<String>> = (0..8).map(|i| vec![format!("{}", i), "Dry".into()]).collect();
        let catalog = Arc::new(Catalog::new(vec!["id".into(), "Skin Type".into()], rows));
        let recommender = ProductRecommender::new(catalog, DEFAULT_LIMIT);
        assert_eq!(recommender.recommend(SkinType::Dry, None).unwrap().products.len(), 5);
        assert_eq!(recommender.recommend(SkinType::Dry, Some(2)).unwrap().products.len(), 2);
    }

    #[test]
    fn test_hydrating_column_not_taken_for_rating() {
        let catalog = catalog(
            &["Code", "Skin_Type", "Is_Hydrating", "Rating"],
            &[&["low", "Dry", "yes", "3.1"], &["high", "Dry", "no", "4.9"]],
        );
        let result = recommend(&catalog, SkinType::Dry, 5).unwrap();
        let codes: Vec<&str> = result.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["high", "low"]);
        assert_eq!(result.products[0].rating, Some(4.9));
    }

    #[test]
    fn test_concurrent_recommendations_share_catalog() {
        let shared_catalog = Arc::new(catalog(
            &["Code", "Skin Type", "Rating"],
            &[
                &["d1", "Dry", "4.0"],
                &["o1", "Oily", "3.5"],
                &["d2", "dry, sensitive", "4.6"],
                &["o2", "oily, combination", "4.9"],
                &["n1", "Normal", "4.1"],
            ],
        ));
        let before = shared_catalog.rows().to_vec();
        let recommender = ProductRecommender::new(Arc::clone(&shared_catalog), DEFAULT_LIMIT);

        let expected: [(SkinType, &[&str]); 4] = [
            (SkinType::Dry, &["d2", "d1"]),
            (SkinType::Oily, &["o2", "o1"]),
            (SkinType::Normal, &["n1"]),
            (SkinType::Combination, &["o2"]),
        ];
        std::thread::scope(|scope| {
            for _ in 0..4 {
                for (label, codes) in expected {
                    let recommender = &recommender;
                    scope.spawn(move || {
                        let result = recommender.recommend(label, None).unwrap();
                        let found: Vec<&str> =
                            result.products.iter().map(|p| p.code.as_str()).collect();
                        assert_eq!(found, codes);
                    });
                }
            }
        });

        assert_eq!(shared_catalog.rows(), before.as_slice());
    }

    #[test]
    fn test_catalog_not_mutated() {
        let catalog = catalog(
            &["Code", "Skin Type", "Rating"],
            &[&["a", "Dry", "1"], &["b", "Dry", "5"]],
        );
        let before = catalog.rows().to_vec();
        recommend(&catalog, SkinType::Dry, 1).unwrap();
        assert_eq!(catalog.rows(), before.as_slice());
    }
}
