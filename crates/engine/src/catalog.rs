//! Static crop reference data.
//!
//! The catalog is built once at start-up and never written afterwards.
//! Construction validates every profile and reports all violations in one
//! error, since a bad profile would otherwise surface later as a division
//! by zero in harvest progress.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::EngineError;

/// One growable crop and the water chemistry it wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub id: String,
    pub name: String,
    pub category: String,
    pub days_to_harvest: u32,
    pub target_ph: f64,
    /// Target conductivity in mS/cm.
    pub target_ec: f64,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// Immutable, non-empty list of crop profiles.
#[derive(Debug, Clone)]
pub struct Catalog {
    crops: Vec<Arc<CropProfile>>,
}

// ---------------------------------------------------------------------------
// Construction & lookup
// ---------------------------------------------------------------------------

impl Catalog {
    pub fn new(profiles: Vec<CropProfile>) -> Result<Self, EngineError> {
        let mut errors: Vec<String> = Vec::new();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        if profiles.is_empty() {
            errors.push("catalog is empty".to_string());
        }

        for (i, p) in profiles.iter().enumerate() {
            let ctx = if p.id.trim().is_empty() {
                format!("crops[{i}]")
            } else {
                format!("crop '{}'", p.id)
            };

            if p.id.trim().is_empty() {
                errors.push(format!("{ctx}: id is empty"));
            } else if !seen_ids.insert(&p.id) {
                errors.push(format!("{ctx}: duplicate id"));
            }
            if p.name.trim().is_empty() {
                errors.push(format!("{ctx}: name is empty"));
            }
            if p.days_to_harvest == 0 {
                errors.push(format!("{ctx}: days_to_harvest must be at least 1"));
            }
            if !(0.0..=14.0).contains(&p.target_ph) {
                errors.push(format!(
                    "{ctx}: target_ph {} out of range [0.0, 14.0]",
                    p.target_ph
                ));
            }
            if !p.target_ec.is_finite() || p.target_ec < 0.0 {
                errors.push(format!(
                    "{ctx}: target_ec {} must be a non-negative number",
                    p.target_ec
                ));
            }
        }

        if !errors.is_empty() {
            return Err(EngineError::InvalidConfiguration(errors.join("; ")));
        }

        Ok(Self {
            crops: profiles.into_iter().map(Arc::new).collect(),
        })
    }

    /// The five crops the appliance ships with.
    pub fn builtin() -> Self {
        Self {
            crops: builtin_profiles().into_iter().map(Arc::new).collect(),
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, id: &str) -> Option<Arc<CropProfile>> {
        self.crops.iter().find(|c| c.id == id).cloned()
    }

    /// First entry; used as the default crop at start-up.
    pub fn first(&self) -> Arc<CropProfile> {
        // Non-empty is enforced by both constructors.
        Arc::clone(&self.crops[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropProfile> {
        self.crops.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

fn profile(
    id: &str,
    name: &str,
    category: &str,
    days_to_harvest: u32,
    target_ph: f64,
    target_ec: f64,
    icon: &str,
    description: &str,
) -> CropProfile {
    CropProfile {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        days_to_harvest,
        target_ph,
        target_ec,
        icon: icon.to_string(),
        description: description.to_string(),
    }
}

pub fn builtin_profiles() -> Vec<CropProfile> {
    vec![
        profile("lettuce", "Lettuce", "Leaf", 45, 5.8, 1.2, "🥬", "Full of water and fibre. Grows fast."),
        profile("basil", "Basil", "Herb", 60, 6.0, 1.6, "🌿", "Essential aromatic. Needs plenty of light."),
        profile("petunia", "Petunia", "Flower", 70, 5.5, 1.8, "🌸", "Cascading ornamental with vivid colours."),
        profile("nasturtium", "Nasturtium", "Flower", 50, 6.0, 1.4, "🌺", "Peppery edible flower. Repels pests."),
        profile("strawberry", "Strawberries", "Fruit", 90, 5.8, 2.0, "🍓", "Sweet and rich in vitamin C."),
    ]
}
