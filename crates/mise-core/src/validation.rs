//! # Validation Module
//!
//! Business rule validation for actions entering the sync queue.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine enqueue (Rust)                                        │
//! │  └── THIS MODULE: well-formedness of the typed payload                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote gateway                                               │
//! │  └── Authoritative business rules on the system of record              │
//! │                                                                         │
//! │  Enqueue never fails for network reasons; a validation error is the    │
//! │  only way an action is refused.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::action::ActionKind;
use crate::error::ValidationError;
use crate::types::{Recipe, StockDeduction};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum SKU length accepted by the engine.
pub const MAX_SKU_LEN: usize = 50;

/// Maximum recipe name length.
pub const MAX_RECIPE_NAME_LEN: usize = 200;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use mise_core::validation::validate_sku;
///
/// assert!(validate_sku("FLOUR-01").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a recipe document.
///
/// ## Rules
/// - Id and name must not be empty; name at most 200 characters
/// - At least one ingredient, each with a valid SKU and positive quantity
/// - Yield must be at least one portion
pub fn validate_recipe(recipe: &Recipe) -> ValidationResult<()> {
    if recipe.id.trim().is_empty() {
        return Err(ValidationError::required("recipe.id"));
    }

    let name = recipe.name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("recipe.name"));
    }
    if name.len() > MAX_RECIPE_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "recipe.name".to_string(),
            max: MAX_RECIPE_NAME_LEN,
        });
    }

    if recipe.ingredients.is_empty() {
        return Err(ValidationError::required("recipe.ingredients"));
    }

    for ingredient in &recipe.ingredients {
        validate_sku(&ingredient.sku)?;
        if ingredient.quantity_milli <= 0 {
            return Err(ValidationError::out_of_range(
                "recipe.ingredients.quantity",
                "must be positive",
            ));
        }
    }

    if recipe.yield_portions == 0 {
        return Err(ValidationError::out_of_range(
            "recipe.yield_portions",
            "must be at least 1",
        ));
    }

    Ok(())
}

fn validate_deductions(deductions: &[StockDeduction]) -> ValidationResult<()> {
    if deductions.is_empty() {
        return Err(ValidationError::required("deductions"));
    }

    for deduction in deductions {
        validate_sku(&deduction.sku)?;
        if deduction.quantity_milli <= 0 {
            return Err(ValidationError::out_of_range(
                "deductions.quantity",
                "must be positive",
            ));
        }
    }

    Ok(())
}

// =============================================================================
// Action Validator
// =============================================================================

/// Validates an action payload before it enters the queue.
///
/// ## Example
/// ```rust
/// use mise_core::action::ActionKind;
/// use mise_core::types::AdjustmentReason;
/// use mise_core::validation::validate_action;
///
/// let kind = ActionKind::StockAdjustment {
///     sku: "FLOUR-01".into(),
///     delta_milli: -2000,
///     reason: AdjustmentReason::Waste,
/// };
/// assert!(validate_action(&kind).is_ok());
/// ```
pub fn validate_action(kind: &ActionKind) -> ValidationResult<()> {
    match kind {
        ActionKind::StockUpdate {
            sku,
            quantity_milli,
        } => {
            validate_sku(sku)?;
            if *quantity_milli < 0 {
                return Err(ValidationError::out_of_range(
                    "quantity",
                    "must not be negative",
                ));
            }
            Ok(())
        }

        ActionKind::StockAdjustment {
            sku, delta_milli, ..
        } => {
            validate_sku(sku)?;
            if *delta_milli == 0 {
                return Err(ValidationError::out_of_range(
                    "delta",
                    "a zero adjustment has no effect",
                ));
            }
            Ok(())
        }

        ActionKind::RecipeCreate { recipe } | ActionKind::RecipeUpdate { recipe } => {
            validate_recipe(recipe)
        }

        ActionKind::RecipeDelete { recipe_id } => {
            if recipe_id.trim().is_empty() {
                return Err(ValidationError::required("recipe_id"));
            }
            Ok(())
        }

        ActionKind::OrderCompletion {
            order_id,
            deductions,
        } => {
            if order_id.trim().is_empty() {
                return Err(ValidationError::required("order_id"));
            }
            validate_deductions(deductions)
        }

        ActionKind::CostUpdate {
            sku,
            unit_cost_cents,
        } => {
            validate_sku(sku)?;
            if *unit_cost_cents < 0 {
                return Err(ValidationError::out_of_range(
                    "unit_cost",
                    "must not be negative",
                ));
            }
            Ok(())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdjustmentReason, RecipeIngredient};

    fn recipe() -> Recipe {
        Recipe {
            id: "recipe-1".into(),
            name: "Sourdough".into(),
            ingredients: vec![RecipeIngredient {
                sku: "FLOUR-01".into(),
                quantity_milli: 500_000,
            }],
            yield_portions: 2,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("FLOUR-01").is_ok());
        assert!(validate_sku("flour_01").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("BAD SKU!").is_err());
        assert!(validate_sku(&"A".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_recipe() {
        assert!(validate_recipe(&recipe()).is_ok());

        let mut empty_name = recipe();
        empty_name.name = "  ".into();
        assert!(validate_recipe(&empty_name).is_err());

        let mut no_ingredients = recipe();
        no_ingredients.ingredients.clear();
        assert!(validate_recipe(&no_ingredients).is_err());

        let mut zero_yield = recipe();
        zero_yield.yield_portions = 0;
        assert!(validate_recipe(&zero_yield).is_err());
    }

    #[test]
    fn test_zero_delta_adjustment_rejected() {
        let kind = ActionKind::StockAdjustment {
            sku: "FLOUR-01".into(),
            delta_milli: 0,
            reason: AdjustmentReason::Correction,
        };
        assert!(validate_action(&kind).is_err());
    }

    #[test]
    fn test_order_completion_requires_deductions() {
        let kind = ActionKind::OrderCompletion {
            order_id: "order-1".into(),
            deductions: vec![],
        };
        assert!(validate_action(&kind).is_err());

        let kind = ActionKind::OrderCompletion {
            order_id: "order-1".into(),
            deductions: vec![StockDeduction {
                sku: "FLOUR-01".into(),
                quantity_milli: 250,
            }],
        };
        assert!(validate_action(&kind).is_ok());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let kind = ActionKind::CostUpdate {
            sku: "FLOUR-01".into(),
            unit_cost_cents: -1,
        };
        assert!(validate_action(&kind).is_err());
    }
}
