/// Lowercases, trims and collapses runs of whitespace, `_` and `-` into a
/// single space, so `" Skin_Type "`, `"Skin Type"` and `"skin-type"` agree.
pub fn normalize_column_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_token(normalized: &str, token: &str) -> bool {
    normalized.split(' ').any(|t| t == token)
}

fn has_any_token(normalized: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| has_token(normalized, token))
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("No skin type column found among: {0:?}")]
    MissingSkinType(Vec<String>),
}

/// Column positions resolved once per catalog header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSchema {
    pub skin_type: usize,
    pub rating: Option<usize>,
    pub code: Option<usize>,
    pub name: Option<usize>,
    pub brand: Option<usize>,
    pub price: Option<usize>,
    pub url: Option<usize>,
}

impl CatalogSchema {
    pub fn resolve<S: AsRef<str>>(columns: &[S]) -> Result<Self, SchemaError> {
        let normalized: Vec<String> = columns
            .iter()
            .map(|c| normalize_column_name(c.as_ref()))
            .collect();

        let find = |pred: &dyn Fn(&str) -> bool| normalized.iter().position(|c| pred(c.as_str()));

        let skin_type = find(&|c: &str| c.contains("skin") && c.contains("type")).ok_or_else(|| {
            SchemaError::MissingSkinType(columns.iter().map(|c| c.as_ref().to_string()).collect())
        })?;

        let schema = Self {
            skin_type,
            rating: find(&|c: &str| {
                has_any_token(c, &["rating", "ratings", "review", "reviews", "score"])
            }),
            code: find(&|c: &str| has_token(c, "code") || has_token(c, "id") || has_token(c, "sku")),
            name: find(&|c: &str| has_token(c, "name") && !c.contains("brand")),
            brand: find(&|c: &str| c.contains("brand")),
            price: find(&|c: &str| c.contains("price")),
            url: find(&|c: &str| has_any_token(c, &["url", "website", "link"])),
        };
        log::debug!("Resolved catalog schema {:?}", schema);
        Ok(schema)
    }
}
