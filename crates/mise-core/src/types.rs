//! # Domain Types
//!
//! Payload types carried by queued actions.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Payload Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Recipe      │   │ StockDeduction  │   │AdjustmentReason │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  sku            │   │  Waste          │       │
//! │  │  name           │   │  quantity       │   │  Breakage       │       │
//! │  │  ingredients    │   └─────────────────┘   │  Correction     │       │
//! │  │  yield_portions │                         │  Received ...   │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   EntityKind    │   The remote entity an action targets:            │
//! │  │  ─────────────  │   a stock item (SKU), a recipe, or an order.      │
//! │  │  StockItem      │                                                   │
//! │  │  Recipe         │                                                   │
//! │  │  Order          │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Convention
//! All monetary values are integer cents (i64). Never floats.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Entity Kind
// =============================================================================

/// The kind of remote entity an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An inventory item identified by SKU.
    StockItem,

    /// A recipe document.
    Recipe,

    /// A customer order.
    Order,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::StockItem => write!(f, "stock_item"),
            EntityKind::Recipe => write!(f, "recipe"),
            EntityKind::Order => write!(f, "order"),
        }
    }
}

// =============================================================================
// Stock Adjustment Reason
// =============================================================================

/// Reason code attached to a manual stock adjustment.
///
/// The remote side records the reason for compliance reporting; the engine
/// only carries it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// Spoiled or expired stock written off.
    Waste,

    /// Stock destroyed by accident.
    Breakage,

    /// Suspected theft or unexplained loss.
    Theft,

    /// Manual count correction after a stocktake.
    Correction,

    /// Goods received from a supplier.
    Received,

    /// Stock moved to another location.
    Transfer,
}

impl std::fmt::Display for AdjustmentReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustmentReason::Waste => write!(f, "waste"),
            AdjustmentReason::Breakage => write!(f, "breakage"),
            AdjustmentReason::Theft => write!(f, "theft"),
            AdjustmentReason::Correction => write!(f, "correction"),
            AdjustmentReason::Received => write!(f, "received"),
            AdjustmentReason::Transfer => write!(f, "transfer"),
        }
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// An ingredient line within a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeIngredient {
    /// Stock Keeping Unit of the ingredient.
    pub sku: String,

    /// Quantity consumed per yield, in the item's base unit (thousandths).
    ///
    /// Stored as an integer to avoid float drift: 1500 = 1.5 units.
    pub quantity_milli: i64,
}

/// A recipe document synced to the remote system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recipe {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the recipe catalog.
    pub name: String,

    /// Ingredient lines. A valid recipe has at least one.
    pub ingredients: Vec<RecipeIngredient>,

    /// Number of portions one batch yields.
    pub yield_portions: u32,
}

// =============================================================================
// Stock Deduction
// =============================================================================

/// One inventory deduction produced by completing an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDeduction {
    /// Stock Keeping Unit of the deducted item.
    pub sku: String,

    /// Quantity deducted, in thousandths of the base unit.
    pub quantity_milli: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::StockItem.to_string(), "stock_item");
        assert_eq!(EntityKind::Recipe.to_string(), "recipe");
        assert_eq!(EntityKind::Order.to_string(), "order");
    }

    #[test]
    fn test_adjustment_reason_serde_tag() {
        let json = serde_json::to_string(&AdjustmentReason::Waste).unwrap();
        assert_eq!(json, "\"waste\"");
    }
}
