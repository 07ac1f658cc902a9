//! Ingredient demand aggregation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use store::{IngredientId, RecipeLine};

/// Total quantity required per ingredient across all lines of an order.
///
/// Iteration is in ascending ingredient id, which is also the order in which
/// stock rows are locked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientDemand {
    required: BTreeMap<IngredientId, Decimal>,
}

impl IngredientDemand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `portions` servings of a recipe.
    pub fn add_recipe(&mut self, recipe: &[RecipeLine], portions: u32) {
        let portions = Decimal::from(portions);
        for line in recipe {
            *self
                .required
                .entry(line.ingredient_id)
                .or_insert(Decimal::ZERO) += line.quantity_per_unit * portions;
        }
    }

    /// Returns the demanded ingredient ids in ascending order.
    pub fn ingredient_ids(&self) -> Vec<IngredientId> {
        self.required.keys().copied().collect()
    }

    pub fn get(&self, id: IngredientId) -> Option<Decimal> {
        self.required.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IngredientId, Decimal)> + '_ {
        self.required.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    pub fn len(&self) -> usize {
        self.required.len()
    }
}
