//! World-level scenarios exercising the public facade end to end


use crate::config::PhysicsConfig;
use crate::foundation::math::Vec3;
use crate::physics::{create_world, ComponentId, PhysicsWorld};

/// World with gravity switched off so scenarios only see their own velocities
fn weightless_world(config: PhysicsConfig) -> Box<dyn PhysicsWorld + Send> {
    crate::foundation::logging::init_for_tests();
    create_world(&config.with_gravity(Vec3::zeros()))
}

fn position_of(world: &dyn PhysicsWorld, id: ComponentId) -> Vec3 {
    world.component(id).map(|c| c.transform.position).unwrap_or_else(|| panic!("{id} not registered"))
}
