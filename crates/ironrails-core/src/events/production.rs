use serde::{Deserialize, Serialize};

use super::{EventContext, EventHeader};
use crate::calendar::Day;
use crate::components::Resource;
use crate::error::SimResult;
use crate::stations::AssociationId;

/// Adds one production batch to an association every interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationEvent {
    pub header: EventHeader,
    pub association: AssociationId,
    pub batch: Resource,
}

impl GenerationEvent {
    pub fn new(name: String, interval: Day, current_day: Day, association: AssociationId, batch: Resource) -> Self {
        Self {
            header: EventHeader::new(name, interval, current_day),
            association,
            batch,
        }
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        let association = ctx.scenario.association_mut(self.association)?;
        let stored = association.inventory.add_resource(&self.batch);
        self.header.advance_by_interval();

        if stored == 0 {
            log::debug!(
                "{} storage full, {} batch lost",
                association.name,
                self.batch.resource_type
            );
            return Ok(Vec::new());
        }
        association.inventory.set_updated(true);

        if stored < self.batch.quantity {
            log::debug!(
                "{} storage full, {} of {} {} lost",
                association.name,
                self.batch.quantity - stored,
                self.batch.quantity,
                self.batch.resource_type
            );
        }

        Ok(vec![format!(
            "{} produced {} {}",
            association.name, stored, self.batch.resource_type
        )])
    }
}

/// Turns one batch of each input into one batch of output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformingEvent {
    pub header: EventHeader,
    pub association: AssociationId,
    pub inputs: Vec<Resource>,
    pub output: Resource,
}

impl TransformingEvent {
    pub fn new(
        name: String,
        interval: Day,
        current_day: Day,
        association: AssociationId,
        inputs: Vec<Resource>,
        output: Resource,
    ) -> Self {
        Self {
            header: EventHeader::new(name, interval, current_day),
            association,
            inputs,
            output,
        }
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        self.header.advance_by_interval();
        let association = ctx.scenario.association_mut(self.association)?;

        // All or nothing: a partial input set leaves the stock untouched
        let missing = self
            .inputs
            .iter()
            .find(|input| association.inventory.quantity_of(&input.resource_type) < input.quantity);
        if let Some(missing) = missing {
            log::debug!(
                "{} cannot make {}: not enough {}",
                association.name,
                self.output.resource_type,
                missing.resource_type
            );
            return Ok(Vec::new());
        }

        // The output must fit once the inputs are gone
        let consumed: u32 = self.inputs.iter().map(|input| input.quantity).sum();
        let free = association
            .inventory
            .capacity
            .saturating_sub(association.inventory.total_items().saturating_sub(consumed));
        if free < self.output.quantity {
            log::debug!(
                "{} has no room for {} {}",
                association.name,
                self.output.quantity,
                self.output.resource_type
            );
            return Ok(Vec::new());
        }

        for input in &self.inputs {
            association.inventory.remove_resource(input);
        }
        association.inventory.add_resource(&self.output);
        association.inventory.set_updated(true);

        Ok(vec![format!(
            "{} transformed {} into {} {}",
            association.name,
            describe(&self.inputs),
            self.output.quantity,
            self.output.resource_type
        )])
    }
}

fn describe(resources: &[Resource]) -> String {
    resources
        .iter()
        .map(|r| format!("{} {}", r.quantity, r.resource_type))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Drains the full stock of one resource type out of the economy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEvent {
    pub header: EventHeader,
    pub association: AssociationId,
    pub resource_type: String,
}

impl ExportEvent {
    pub fn new(name: String, interval: Day, current_day: Day, association: AssociationId, resource_type: &str) -> Self {
        Self {
            header: EventHeader::new(name, interval, current_day),
            association,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        self.header.advance_by_interval();
        let association = ctx.scenario.association_mut(self.association)?;

        let quantity = association.inventory.quantity_of(&self.resource_type);
        if quantity == 0 {
            return Ok(Vec::new());
        }

        association
            .inventory
            .remove_resource(&Resource::new(&self.resource_type, quantity));
        association.inventory.set_updated(true);

        Ok(vec![format!(
            "{} exported {} {}",
            association.name, quantity, self.resource_type
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TimeDate;
    use crate::config::Catalog;
    use crate::resources::Simulation;
    use crate::scenario::Scenario;
    use crate::stations::Position;

    fn setup(template: &str) -> (Simulation, Scenario, AssociationId) {
        let catalog = Catalog::default();
        let mut scenario = Scenario::new("test");
        let id = scenario
            .spawn_association(&catalog, template, "Works", Position::new(0, 0))
            .unwrap();
        let simulation = Simulation::new(TimeDate::new(1850, 1, 1).unwrap(), 0, 7);
        (simulation, scenario, id)
    }

    #[test]
    fn test_generation_adds_batch_and_reschedules() {
        let (mut simulation, mut scenario, id) = setup("coal_mine");
        let now = simulation.current_time();
        let mut event = GenerationEvent::new("gen".to_string(), 5, now, id, Resource::new("coal", 20));
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        let logs = event.trigger(&mut ctx).unwrap();
        assert_eq!(logs, vec!["Works produced 20 coal".to_string()]);
        assert_eq!(event.header.next_generation_date, now + 10);

        let works = &scenario.associations[&id];
        assert_eq!(works.inventory.quantity_of("coal"), 20);
        assert!(works.inventory.updated);
    }

    #[test]
    fn test_generation_is_bounded_by_inventory() {
        let (mut simulation, mut scenario, id) = setup("coal_mine");
        let mut event = GenerationEvent::new("gen".to_string(), 1, 0, id, Resource::new("coal", 150));
        for _ in 0..3 {
            let mut ctx = EventContext {
                simulation: &mut simulation,
                scenario: &mut scenario,
            };
            event.trigger(&mut ctx).unwrap();
        }
        assert_eq!(scenario.associations[&id].inventory.quantity_of("coal"), 200);
    }

    #[test]
    fn test_generation_into_full_storage_is_silent() {
        let (mut simulation, mut scenario, id) = setup("coal_mine");
        {
            let mine = scenario.association_mut(id).unwrap();
            mine.inventory.add_resource(&Resource::new("coal", 200));
            mine.inventory.set_updated(false);
        }

        let mut event = GenerationEvent::new("gen".to_string(), 5, 0, id, Resource::new("coal", 20));
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        assert!(event.trigger(&mut ctx).unwrap().is_empty());
        assert_eq!(event.header.next_generation_date, 10);
        assert!(!scenario.associations[&id].inventory.updated);
    }

    #[test]
    fn test_transformation_is_atomic() {
        let (mut simulation, mut scenario, id) = setup("steel_mill");
        scenario
            .association_mut(id)
            .unwrap()
            .inventory
            .add_resource(&Resource::new("iron_ore", 30));

        let mut event = TransformingEvent::new(
            "steel".to_string(),
            6,
            0,
            id,
            vec![Resource::new("iron_ore", 15), Resource::new("coal", 20)],
            Resource::new("steel", 10),
        );
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        let logs = event.trigger(&mut ctx).unwrap();
        assert!(logs.is_empty());
        assert_eq!(event.header.next_generation_date, 12);

        let works = &scenario.associations[&id];
        assert_eq!(works.inventory.quantity_of("iron_ore"), 30);
        assert_eq!(works.inventory.quantity_of("coal"), 0);
        assert_eq!(works.inventory.quantity_of("steel"), 0);
    }

    #[test]
    fn test_transformation_consumes_one_batch_of_each_input() {
        let (mut simulation, mut scenario, id) = setup("steel_mill");
        {
            let works = scenario.association_mut(id).unwrap();
            works.inventory.add_resource(&Resource::new("iron_ore", 30));
            works.inventory.add_resource(&Resource::new("coal", 20));
        }

        let mut event = TransformingEvent::new(
            "steel".to_string(),
            6,
            0,
            id,
            vec![Resource::new("iron_ore", 15), Resource::new("coal", 20)],
            Resource::new("steel", 10),
        );
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        let logs = event.trigger(&mut ctx).unwrap();
        assert_eq!(logs.len(), 1);

        let works = &scenario.associations[&id];
        assert_eq!(works.inventory.quantity_of("iron_ore"), 15);
        assert_eq!(works.inventory.quantity_of("coal"), 0);
        assert_eq!(works.inventory.quantity_of("steel"), 10);
    }

    #[test]
    fn test_transformation_skipped_when_output_does_not_fit() {
        let (mut simulation, mut scenario, id) = setup("steel_mill");
        {
            // Deliveries ignore the capacity, leaving the mill over full
            let works = scenario.association_mut(id).unwrap();
            works.inventory.add_resource_without_limit(&Resource::new("iron_ore", 400));
            works.inventory.add_resource_without_limit(&Resource::new("coal", 400));
            works.inventory.set_updated(false);
        }

        let mut event = TransformingEvent::new(
            "steel".to_string(),
            6,
            0,
            id,
            vec![Resource::new("iron_ore", 15), Resource::new("coal", 20)],
            Resource::new("steel", 10),
        );
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        assert!(event.trigger(&mut ctx).unwrap().is_empty());
        assert_eq!(event.header.next_generation_date, 12);

        let works = &scenario.associations[&id];
        assert_eq!(works.inventory.quantity_of("iron_ore"), 400);
        assert_eq!(works.inventory.quantity_of("coal"), 400);
        assert_eq!(works.inventory.quantity_of("steel"), 0);
        assert!(!works.inventory.updated);
    }

    #[test]
    fn test_transformation_uses_space_freed_by_inputs() {
        let (mut simulation, mut scenario, id) = setup("steel_mill");
        {
            // 300 of 300 in use; the 35 consumed make room for 10 steel
            let works = scenario.association_mut(id).unwrap();
            works.inventory.add_resource(&Resource::new("iron_ore", 150));
            works.inventory.add_resource(&Resource::new("coal", 150));
        }

        let mut event = TransformingEvent::new(
            "steel".to_string(),
            6,
            0,
            id,
            vec![Resource::new("iron_ore", 15), Resource::new("coal", 20)],
            Resource::new("steel", 10),
        );
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        assert_eq!(
            event.trigger(&mut ctx).unwrap(),
            vec!["Works transformed 15 iron_ore + 20 coal into 10 steel".to_string()]
        );
        let works = &scenario.associations[&id];
        assert_eq!(works.inventory.quantity_of("steel"), 10);
        assert_eq!(works.inventory.total_items(), 275);
    }

    #[test]
    fn test_export_drains_everything() {
        let (mut simulation, mut scenario, id) = setup("town_block");
        scenario
            .association_mut(id)
            .unwrap()
            .inventory
            .add_resource(&Resource::new("goods", 37));

        let mut event = ExportEvent::new("export".to_string(), 4, 0, id, "goods");
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        assert_eq!(
            event.trigger(&mut ctx).unwrap(),
            vec!["Works exported 37 goods".to_string()]
        );
        assert!(event.trigger(&mut ctx).unwrap().is_empty());
        assert_eq!(event.header.next_generation_date, 12);
        assert_eq!(scenario.associations[&id].inventory.quantity_of("goods"), 0);
    }
}
