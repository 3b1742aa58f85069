#![allow(dead_code)]

use lattice_ecs::{ComponentTypeID, World};

pub const ENTITIES_SMALL: usize = 1_000;
pub const ENTITIES_MED: usize = 10_000;
pub const ENTITIES_LARGE: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy)]
pub struct Health {
    pub hp: i32,
}

pub fn make_world() -> World {
    let mut world = World::new();
    world.register::<Position>().unwrap();
    world.register::<Velocity>().unwrap();
    world.register::<Health>().unwrap();
    world
}

pub fn populate(world: &mut World, count: usize) {
    for i in 0..count {
        world
            .create_with_components(vec![
                world.component(Position { x: i as f32, y: 0.0 }).unwrap(),
                world.component(Velocity { dx: 1.0, dy: 0.5 }).unwrap(),
                world.component(Health { hp: 100 }).unwrap(),
            ])
            .unwrap();
    }
}

pub fn ids(world: &World) -> (ComponentTypeID, ComponentTypeID, ComponentTypeID) {
    (
        world.registry().get::<Position>().unwrap(),
        world.registry().get::<Velocity>().unwrap(),
        world.registry().get::<Health>().unwrap(),
    )
}
