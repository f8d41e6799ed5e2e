//! Kind → spawnable template lookup.

use std::collections::HashMap;

use skygarden_logic::kinds::{IslandKind, PlantKind};
use skygarden_logic::math::{Bounds, Vec3};

/// Spawn data for one plant kind. Points are in plant-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantTemplate {
    pub bounds: Bounds,
    /// Where harvested seeds appear
    pub loot_points: Vec<Vec3>,
    /// Fewest seeds a harvest releases
    pub min_loot: usize,
}

/// Spawn data for one island kind. Points are in island-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandTemplate {
    pub bounds: Bounds,
    /// Attachment point for the island's plant
    pub plant_origin: Vec3,
}

/// Templates keyed by kind, plus the bounds used when placing idle seeds.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    plants: HashMap<PlantKind, PlantTemplate>,
    islands: HashMap<IslandKind, IslandTemplate>,
    pub seed_bounds: Bounds,
}

impl TemplateCatalog {
    pub fn empty() -> Self {
        Self {
            plants: HashMap::new(),
            islands: HashMap::new(),
            seed_bounds: Bounds::from_center_extents(Vec3::ZERO, Vec3::splat(0.05)),
        }
    }

    /// A template for every kind, sized for a hanging ceiling garden.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        for (i, kind) in PlantKind::all().iter().enumerate() {
            let height = 0.4 + 0.1 * i as f32;
            catalog.plants.insert(
                *kind,
                PlantTemplate {
                    bounds: Bounds::new(Vec3::new(-0.15, 0.0, -0.15), Vec3::new(0.15, height, 0.15)),
                    loot_points: vec![
                        Vec3::new(0.1, height, 0.0),
                        Vec3::new(-0.1, height, 0.0),
                        Vec3::new(0.0, height, 0.1),
                        Vec3::new(0.0, height, -0.1),
                        Vec3::new(0.0, height * 0.6, 0.12),
                    ],
                    min_loot: 2,
                },
            );
        }
        catalog.islands.insert(
            IslandKind::BigIsland,
            IslandTemplate {
                bounds: Bounds::new(Vec3::new(-0.3, 0.0, -0.3), Vec3::new(0.3, 0.25, 0.3)),
                plant_origin: Vec3::new(0.0, 0.25, 0.0),
            },
        );
        catalog
    }

    pub fn with_plant(mut self, kind: PlantKind, template: PlantTemplate) -> Self {
        self.plants.insert(kind, template);
        self
    }

    pub fn with_island(mut self, kind: IslandKind, template: IslandTemplate) -> Self {
        self.islands.insert(kind, template);
        self
    }

    pub fn plant(&self, kind: PlantKind) -> Option<&PlantTemplate> {
        self.plants.get(&kind)
    }

    pub fn island(&self, kind: IslandKind) -> Option<&IslandTemplate> {
        self.islands.get(&kind)
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_covers_every_kind() {
        let catalog = TemplateCatalog::standard();
        for kind in PlantKind::all() {
            let template = catalog.plant(*kind).unwrap();
            assert!(template.min_loot <= template.loot_points.len());
        }
        for kind in IslandKind::all() {
            assert!(catalog.island(*kind).is_some());
        }
    }

    #[test]
    fn empty_catalog_misses() {
        assert!(TemplateCatalog::empty().plant(PlantKind::KelpBoa).is_none());
    }
}
