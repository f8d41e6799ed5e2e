//! Per-tick systems over the garden world.

use hecs::World;

use skygarden_logic::growth::{GrowthContext, GrowthEvent, GrowthSimulator};

use crate::clock::whole_seconds;
use crate::components::{Anchor, EntityId, Island, Plant};
use crate::persistence::{IslandRecord, PlantRecord};

/// Advance every live plant by one tick and collect what they raised.
pub fn growth_system(world: &mut World, ctx: &GrowthContext) -> Vec<(EntityId, GrowthEvent)> {
    let mut raised = Vec::new();
    for (_, (anchor, sim)) in world.query_mut::<(&Anchor, &mut GrowthSimulator)>() {
        sim.tick(ctx);
        raised.extend(sim.drain_events().into_iter().map(|event| (anchor.id, event)));
    }
    raised
}

/// Current `(id, kind, growth)` of every live plant and island.
pub fn snapshot_system(world: &World) -> (Vec<PlantRecord>, Vec<IslandRecord>) {
    let plants = world
        .query::<(&Anchor, &Plant, &GrowthSimulator)>()
        .iter()
        .map(|(_, (anchor, plant, sim))| PlantRecord {
            id: anchor.id,
            kind: plant.kind,
            growth: sim.growth(),
            created_at: whole_seconds(plant.created_at),
        })
        .collect();

    let islands = world
        .query::<(&Anchor, &Island)>()
        .iter()
        .map(|(_, (anchor, island))| IslandRecord {
            id: anchor.id,
            kind: island.kind,
        })
        .collect();

    (plants, islands)
}
