use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use varistore_core::{DomainError, DomainResult, Entity, ProductId};

/// Product kind as stored by the base persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
    Variable,
    Variation,
    Grouped,
    External,
}

impl ProductType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Variable => "variable",
            ProductType::Variation => "variation",
            ProductType::Grouped => "grouped",
            ProductType::External => "external",
        }
    }
}

impl core::str::FromStr for ProductType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(ProductType::Simple),
            "variable" => Ok(ProductType::Variable),
            "variation" => Ok(ProductType::Variation),
            "grouped" => Ok(ProductType::Grouped),
            "external" => Ok(ProductType::External),
            other => Err(DomainError::validation(format!("unknown product type '{other}'"))),
        }
    }
}

/// Stock status of a purchasable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "outofstock")]
    OutOfStock,
    #[serde(rename = "onbackorder")]
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::InStock => "instock",
            StockStatus::OutOfStock => "outofstock",
            StockStatus::OnBackorder => "onbackorder",
        }
    }

    pub fn is_in_stock(self) -> bool {
        self == StockStatus::InStock
    }
}

impl Default for StockStatus {
    fn default() -> Self {
        StockStatus::InStock
    }
}

impl core::str::FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instock" => Ok(StockStatus::InStock),
            "outofstock" => Ok(StockStatus::OutOfStock),
            "onbackorder" => Ok(StockStatus::OnBackorder),
            other => Err(DomainError::validation(format!("unknown stock status '{other}'"))),
        }
    }
}

/// Physical dimensions; a missing or non-positive side counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
}

impl Dimensions {
    pub fn has_any(&self) -> bool {
        [self.length, self.width, self.height]
            .into_iter()
            .flatten()
            .any(|side| side > Decimal::ZERO)
    }
}

/// Raw product row as read through the base persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub kind: ProductType,
    pub parent_id: Option<ProductId>,
    pub name: String,
    pub sku: String,
    pub menu_order: i64,
    pub price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_status: StockStatus,
    pub weight: Option<Decimal>,
    pub dimensions: Dimensions,
}

impl ProductRecord {
    /// A bare record of the given kind with no prices and no physical data.
    pub fn new(id: ProductId, kind: ProductType) -> Self {
        Self {
            id,
            kind,
            parent_id: None,
            name: String::new(),
            sku: String::new(),
            menu_order: 0,
            price: None,
            regular_price: None,
            sale_price: None,
            stock_status: StockStatus::InStock,
            weight: None,
            dimensions: Dimensions::default(),
        }
    }

    pub fn has_weight(&self) -> bool {
        self.weight.is_some_and(|w| w > Decimal::ZERO)
    }
}

/// A purchasable child of a variable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    id: ProductId,
    parent_id: ProductId,
    menu_order: i64,
    price: Option<Decimal>,
    regular_price: Option<Decimal>,
    sale_price: Option<Decimal>,
    stock_status: StockStatus,
    weight: Option<Decimal>,
    dimensions: Dimensions,
}

impl Variation {
    /// Lift a base record into a variation; `None` unless it is a variation
    /// with a parent.
    pub fn from_record(record: ProductRecord) -> Option<Self> {
        if record.kind != ProductType::Variation {
            return None;
        }
        let parent_id = record.parent_id?;
        Some(Self {
            id: record.id,
            parent_id,
            menu_order: record.menu_order,
            price: record.price,
            regular_price: record.regular_price,
            sale_price: record.sale_price,
            stock_status: record.stock_status,
            weight: record.weight,
            dimensions: record.dimensions,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn parent_id(&self) -> ProductId {
        self.parent_id
    }

    pub fn menu_order(&self) -> i64 {
        self.menu_order
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn regular_price(&self) -> Option<Decimal> {
        self.regular_price
    }

    pub fn sale_price(&self) -> Option<Decimal> {
        self.sale_price
    }

    pub fn stock_status(&self) -> StockStatus {
        self.stock_status
    }

    pub fn weight(&self) -> Option<Decimal> {
        self.weight
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn has_weight(&self) -> bool {
        self.weight.is_some_and(|w| w > Decimal::ZERO)
    }
}

impl Entity for Variation {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Parent product whose price is derived from its variations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableProduct {
    id: ProductId,
    name: String,
    sku: String,
    regular_price: Option<Decimal>,
    sale_price: Option<Decimal>,
    children: Vec<ProductId>,
    visible_children: Vec<ProductId>,
    variation_attributes: BTreeMap<String, Vec<String>>,
}

impl VariableProduct {
    /// A parent with no children loaded yet.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            name: String::new(),
            sku: String::new(),
            regular_price: None,
            sale_price: None,
            children: Vec::new(),
            visible_children: Vec::new(),
            variation_attributes: BTreeMap::new(),
        }
    }

    /// Map a base record onto a variable product.
    ///
    /// Regular and sale prices never apply to a variable product and are
    /// cleared here whatever the record carries.
    pub fn from_record(record: ProductRecord) -> DomainResult<Self> {
        if record.kind != ProductType::Variable {
            return Err(DomainError::validation(format!(
                "product {} is '{}', not variable",
                record.id,
                record.kind.as_str()
            )));
        }
        let mut product = Self::empty(record.id);
        product.name = record.name;
        product.sku = record.sku;
        product.set_regular_price(None);
        product.set_sale_price(None);
        Ok(product)
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn regular_price(&self) -> Option<Decimal> {
        self.regular_price
    }

    pub fn sale_price(&self) -> Option<Decimal> {
        self.sale_price
    }

    pub fn set_regular_price(&mut self, price: Option<Decimal>) {
        self.regular_price = price;
    }

    pub fn set_sale_price(&mut self, price: Option<Decimal>) {
        self.sale_price = price;
    }

    pub fn children(&self) -> &[ProductId] {
        &self.children
    }

    pub fn set_children(&mut self, children: Vec<ProductId>) {
        self.children = children;
    }

    pub fn visible_children(&self) -> &[ProductId] {
        &self.visible_children
    }

    pub fn set_visible_children(&mut self, children: Vec<ProductId>) {
        self.visible_children = children;
    }

    pub fn variation_attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.variation_attributes
    }

    pub fn set_variation_attributes(&mut self, attributes: BTreeMap<String, Vec<String>>) {
        self.variation_attributes = attributes;
    }
}

impl Entity for VariableProduct {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
