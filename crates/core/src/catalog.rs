//! Product catalog types and listing rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search;
use crate::types::{Price, PriceError, ProductId};

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Errors raised while validating product input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductInputError {
    /// A required field was absent or blank.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The price could not be used.
    #[error("price: {0}")]
    Price(#[from] PriceError),
    /// A product must belong to at least one category.
    #[error("at least one category is required")]
    NoCategories,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub categories: Vec<String>,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Create a product from validated input and stored image references.
    #[must_use]
    pub fn new(draft: ProductDraft, images: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::generate(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            categories: draft.categories,
            images,
            sizes: draft.sizes,
            colors: draft.colors,
            in_stock: draft.in_stock,
            featured: draft.featured,
            created_at: now,
        }
    }

    /// Replace every editable field. ID and creation time are kept.
    pub fn apply(&mut self, draft: ProductDraft, images: Vec<String>) {
        self.name = draft.name;
        self.description = draft.description;
        self.price = draft.price;
        self.categories = draft.categories;
        self.images = images;
        self.sizes = draft.sizes;
        self.colors = draft.colors;
        self.in_stock = draft.in_stock;
        self.featured = draft.featured;
    }
}

/// Raw product fields as submitted by the admin console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
}

const fn default_true() -> bool {
    true
}

/// Product fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub categories: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub featured: bool,
}

impl ProductFields {
    /// Check required fields and normalize list entries.
    ///
    /// # Errors
    ///
    /// Returns [`ProductInputError`] when name, description or price is
    /// missing, the price is invalid, or no category is given.
    pub fn validate(self) -> Result<ProductDraft, ProductInputError> {
        let name = required(self.name, "name")?;
        let description = required(self.description, "description")?;
        let price = Price::parse(&required(self.price, "price")?)?;
        let categories = clean_list(self.categories);
        if categories.is_empty() {
            return Err(ProductInputError::NoCategories);
        }

        Ok(ProductDraft {
            name,
            description,
            price,
            categories,
            sizes: clean_list(self.sizes),
            colors: clean_list(self.colors),
            in_stock: self.in_stock,
            featured: self.featured,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ProductInputError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ProductInputError::Missing(field))
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Image list for an updated product: retained references first, then new
/// uploads, each group in the order given.
#[must_use]
pub fn merge_images(retained: Vec<String>, uploaded: Vec<String>) -> Vec<String> {
    let mut images = retained;
    images.extend(uploaded);
    images
}

/// Sort orders understood by the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    /// Most recently created first.
    Newest,
}

impl ProductSort {
    /// Parse a `sort` query value. Unknown values mean natural order.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "newest" => Some(Self::Newest),
            _ => None,
        }
    }
}

/// A product listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub sort: Option<ProductSort>,
    page: u32,
    limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            featured: None,
            sort: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    /// Set the 1-indexed page and page size.
    ///
    /// Zero would make the offset or page count meaningless, so it is
    /// treated as one.
    #[must_use]
    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = page.max(1);
        self.limit = limit.max(1);
        self
    }

    /// The 1-indexed page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// The page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of matching rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Lowercased alphanumeric terms of the search text, stopwords removed.
    ///
    /// A product matches a search when any term matches.
    #[must_use]
    pub fn search_terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .map_or_else(Vec::new, |text| search::words(text).collect())
    }

    /// Whether `product` passes every filter of this query.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && !product.categories.iter().any(|c| c == category)
        {
            return false;
        }
        if let Some(featured) = self.featured
            && product.featured != featured
        {
            return false;
        }
        if self.search.is_some() {
            let stems: Vec<String> = self.search_terms().iter().map(|t| search::stem(t)).collect();
            if !stems.iter().any(|stem| mentions(product, stem)) {
                return false;
            }
        }
        true
    }
}

fn mentions(product: &Product, stem: &str) -> bool {
    std::iter::once(product.name.as_str())
        .chain(std::iter::once(product.description.as_str()))
        .chain(product.categories.iter().map(String::as_str))
        .flat_map(search::words)
        .any(|word| search::stem(&word) == stem)
}

/// Order products in place according to `sort`.
///
/// `None` keeps the slice as given, which callers hold in insertion order.
pub fn sort_products(products: &mut [Product], sort: Option<ProductSort>) {
    match sort {
        Some(ProductSort::PriceAsc) => products.sort_by(|a, b| a.price.cmp(&b.price)),
        Some(ProductSort::PriceDesc) => products.sort_by(|a, b| b.price.cmp(&a.price)),
        Some(ProductSort::Newest) => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        None => {}
    }
}

/// `ceil(total / limit)`, zero when nothing matches.
#[must_use]
pub fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
}

impl ProductPage {
    /// Assemble a page from the rows of `query`'s window and the match count.
    #[must_use]
    pub fn new(products: Vec<Product>, query: &ProductQuery, total: u64) -> Self {
        Self {
            products,
            current_page: query.page(),
            total_pages: total_pages(total, query.limit()),
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn fields() -> ProductFields {
        ProductFields {
            name: Some("Denim Jacket".into()),
            description: Some("Faded 90s denim".into()),
            price: Some("45.00".into()),
            categories: vec!["Jackets".into(), " ".into()],
            sizes: vec!["M".into(), "L".into()],
            colors: vec![],
            in_stock: true,
            featured: false,
        }
    }

    fn product(name: &str, price: &str, categories: &[&str]) -> Product {
        Product::new(
            ProductFields {
                name: Some(name.into()),
                description: Some(format!("{name} in good condition")),
                price: Some(price.into()),
                categories: categories.iter().map(|c| (*c).to_owned()).collect(),
                ..ProductFields::default()
            }
            .validate()
            .unwrap(),
            vec![],
            Utc::now(),
        )
    }

    #[test]
    fn test_validate_accepts_complete_fields() {
        let draft = fields().validate().unwrap();
        assert_eq!(draft.name, "Denim Jacket");
        assert_eq!(draft.categories, vec!["Jackets".to_owned()]);
        assert_eq!(draft.sizes.len(), 2);
    }

    #[test]
    fn test_validate_requires_name_description_price() {
        let mut f = fields();
        f.name = Some("   ".into());
        assert_eq!(f.validate(), Err(ProductInputError::Missing("name")));

        let mut f = fields();
        f.description = None;
        assert_eq!(f.validate(), Err(ProductInputError::Missing("description")));

        let mut f = fields();
        f.price = None;
        assert_eq!(f.validate(), Err(ProductInputError::Missing("price")));
    }

    #[test]
    fn test_validate_rejects_bad_price_and_no_categories() {
        let mut f = fields();
        f.price = Some("-5".into());
        assert_eq!(
            f.validate(),
            Err(ProductInputError::Price(PriceError::Negative))
        );

        let mut f = fields();
        f.categories = vec![];
        assert_eq!(f.validate(), Err(ProductInputError::NoCategories));
    }

    #[test]
    fn test_merge_images_keeps_retained_first() {
        let merged = merge_images(
            vec!["a.jpg".into(), "b.jpg".into()],
            vec!["c.jpg".into()],
        );
        assert_eq!(merged, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(ProductSort::parse("price_asc"), Some(ProductSort::PriceAsc));
        assert_eq!(ProductSort::parse("newest"), Some(ProductSort::Newest));
        assert_eq!(ProductSort::parse("popular"), None);
    }

    #[test]
    fn test_pagination_window() {
        let query = ProductQuery::default().paginate(2, 10);
        assert_eq!(query.offset(), 10);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(20, 10), 2);
    }

    #[test]
    fn test_zero_page_and_limit_are_clamped() {
        let query = ProductQuery::default().paginate(0, 0);
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 1);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_matches_category_and_featured() {
        let mut shirt = product("Oxford Shirt", "30", &["Shirts"]);
        let query = ProductQuery {
            category: Some("Shirts".into()),
            ..ProductQuery::default()
        };
        assert!(query.matches(&shirt));
        assert!(!query.matches(&product("Chinos", "40", &["Pants"])));

        let featured_only = ProductQuery {
            featured: Some(true),
            ..ProductQuery::default()
        };
        assert!(!featured_only.matches(&shirt));
        shirt.featured = true;
        assert!(featured_only.matches(&shirt));
    }

    #[test]
    fn test_search_matches_any_term_across_fields() {
        let scarf = product("Silk Scarf", "15", &["Accessories"]);
        let search = |text: &str| ProductQuery {
            search: Some(text.into()),
            ..ProductQuery::default()
        };

        assert!(search("silk").matches(&scarf));
        assert!(search("wool accessories").matches(&scarf));
        assert!(search("CONDITION").matches(&scarf));
        assert!(!search("denim").matches(&scarf));
        assert!(!search("!!!").matches(&scarf));
    }

    #[test]
    fn test_search_folds_plurals_and_ignores_stopwords() {
        let shirt = product("Oxford Shirt", "30", &["Tops"]);
        let search = |text: &str| ProductQuery {
            search: Some(text.into()),
            ..ProductQuery::default()
        };

        assert!(search("shirts").matches(&shirt));
        assert!(search("the oxfords").matches(&shirt));
        assert!(!search("the").matches(&shirt));
        assert!(search("the").search_terms().is_empty());
        assert_eq!(search("The Shirts of Oxford").search_terms(), vec!["shirts", "oxford"]);
    }

    #[test]
    fn test_category_and_search_are_conjunctive() {
        let scarf = product("Silk Scarf", "15", &["Accessories"]);
        let query = ProductQuery {
            category: Some("Shirts".into()),
            search: Some("silk".into()),
            ..ProductQuery::default()
        };
        assert!(!query.matches(&scarf));
    }

    #[test]
    fn test_sort_products() {
        let mut cheap = product("Belt", "10", &["Accessories"]);
        let mut pricey = product("Coat", "90", &["Coats"]);
        let now = Utc::now();
        cheap.created_at = now - Duration::days(1);
        pricey.created_at = now - Duration::days(3);

        let mut items = vec![pricey.clone(), cheap.clone()];
        sort_products(&mut items, Some(ProductSort::PriceAsc));
        assert_eq!(items.first().unwrap().id, cheap.id);

        sort_products(&mut items, Some(ProductSort::PriceDesc));
        assert_eq!(items.first().unwrap().id, pricey.id);

        sort_products(&mut items, Some(ProductSort::Newest));
        assert_eq!(items.first().unwrap().id, cheap.id);
    }
}
