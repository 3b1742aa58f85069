//! Gameplay systems and the plugin wiring them into the app.
//!
//! Every system holds its own cached [`QuerySystem`]; runtime type IDs are
//! resolved once in the `init` hook, after the plugin has registered the
//! component types.

use lattice_ecs::{
    App, ComponentTypeID, EcsResult, EntityHandle, FnSystem, InputManager, KeyCode, Plugin,
    QuerySystem, Stage, System,
};

use super::components::{Ball, Brick, Hud, Lives, Paddle, Position, Score, Velocity};


pub const FIELD_WIDTH: f32 = 200.0;
pub const FIELD_HEIGHT: f32 = 200.0;
pub const PADDLE_SPEED: f32 = 90.0;
pub const BALL_START: (f32, f32) = (100.0, 100.0);
pub const BALL_VELOCITY: (f32, f32) = (40.0, 120.0);
pub const BRICK_ROW_Y: f32 = 180.0;
pub const BRICK_COUNT: usize = 5;

/// Moves the paddle from held arrow keys, clamped to the playfield.
pub struct PaddleControl {
    position_id: ComponentTypeID,
    paddle_id: ComponentTypeID,
    query: Option<QuerySystem>,
}

impl PaddleControl {
    pub fn new() -> Self {
        Self { position_id: 0, paddle_id: 0, query: None }
    }
}

impl System for PaddleControl {
    fn name(&self) -> &str {
        "paddle::control"
    }

    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        self.position_id = app.world.registry().get::<Position>()?;
        self.paddle_id = app.world.registry().get::<Paddle>()?;
        self.query = Some(QuerySystem::new(vec![self.position_id, self.paddle_id]));
        Ok(())
    }

    fn update(&mut self, app: &mut App, dt: f64) -> EcsResult<()> {
        let direction = match app.resources.get::<InputManager>() {
            Some(input) => {
                let mut direction = 0.0f32;
                if input.keys.pressed(KeyCode::Left) {
                    direction -= 1.0;
                }
                if input.keys.pressed(KeyCode::Right) {
                    direction += 1.0;
                }
                direction
            }
            None => return Ok(()), // no input source this frame
        };
        if direction == 0.0 {
            return Ok(());
        }

        let Some(query) = self.query.as_mut() else {
            return Ok(());
        };
        for row in query.query(&app.world) {
            unsafe {
                let paddle = row.get::<Paddle>(self.paddle_id).expect("paddle cell");
                let position = row.get_mut::<Position>(self.position_id).expect("position cell");
                position.x = (position.x + direction * PADDLE_SPEED * dt as f32)
                    .clamp(paddle.half_width, FIELD_WIDTH - paddle.half_width);
            }
        }
        Ok(())
    }
}

/// Integrates positions from velocities.
pub struct BallMovement {
    position_id: ComponentTypeID,
    velocity_id: ComponentTypeID,
    query: Option<QuerySystem>,
}

impl BallMovement {
    pub fn new() -> Self {
        Self { position_id: 0, velocity_id: 0, query: None }
    }
}

impl System for BallMovement {
    fn name(&self) -> &str {
        "ball::movement"
    }

    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        self.position_id = app.world.registry().get::<Position>()?;
        self.velocity_id = app.world.registry().get::<Velocity>()?;
        self.query = Some(QuerySystem::new(vec![self.position_id, self.velocity_id]));
        Ok(())
    }

    fn update(&mut self, app: &mut App, dt: f64) -> EcsResult<()> {
        let Some(query) = self.query.as_mut() else {
            return Ok(());
        };
        for row in query.query(&app.world) {
            unsafe {
                let velocity = row.get::<Velocity>(self.velocity_id).expect("velocity cell");
                let position = row.get_mut::<Position>(self.position_id).expect("position cell");
                position.x += velocity.dx * dt as f32;
                position.y += velocity.dy * dt as f32;
            }
        }
        Ok(())
    }
}

/// Reflects the ball off the side and top walls; a ball lost below the
/// floor costs a life and respawns at the start position.
pub struct WallBounce {
    position_id: ComponentTypeID,
    velocity_id: ComponentTypeID,
    ball_id: ComponentTypeID,
    query: Option<QuerySystem>,
}

impl WallBounce {
    pub fn new() -> Self {
        Self { position_id: 0, velocity_id: 0, ball_id: 0, query: None }
    }
}

impl System for WallBounce {
    fn name(&self) -> &str {
        "ball::wall_bounce"
    }

    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        self.position_id = app.world.registry().get::<Position>()?;
        self.velocity_id = app.world.registry().get::<Velocity>()?;
        self.ball_id = app.world.registry().get::<Ball>()?;
        self.query = Some(QuerySystem::new(vec![
            self.position_id,
            self.velocity_id,
            self.ball_id,
        ]));
        Ok(())
    }

    fn update(&mut self, app: &mut App, _dt: f64) -> EcsResult<()> {
        let Some(query) = self.query.as_mut() else {
            return Ok(());
        };

        let mut balls_lost = 0u32;
        for row in query.query(&app.world) {
            unsafe {
                let ball = row.get::<Ball>(self.ball_id).expect("ball cell");
                let velocity = row.get_mut::<Velocity>(self.velocity_id).expect("velocity cell");
                let position = row.get_mut::<Position>(self.position_id).expect("position cell");

                if position.x - ball.radius < 0.0 {
                    position.x = ball.radius;
                    velocity.dx = velocity.dx.abs();
                }
                if position.x + ball.radius > FIELD_WIDTH {
                    position.x = FIELD_WIDTH - ball.radius;
                    velocity.dx = -velocity.dx.abs();
                }
                if position.y + ball.radius > FIELD_HEIGHT {
                    position.y = FIELD_HEIGHT - ball.radius;
                    velocity.dy = -velocity.dy.abs();
                }
                if position.y - ball.radius < 0.0 {
                    // Lost below the floor: respawn at the serve position.
                    balls_lost += 1;
                    position.x = BALL_START.0;
                    position.y = BALL_START.1;
                    velocity.dx = BALL_VELOCITY.0;
                    velocity.dy = BALL_VELOCITY.1;
                }
            }
        }

        if balls_lost > 0 {
            if let Some(lives) = app.resources.get_mut::<Lives>() {
                lives.remaining = lives.remaining.saturating_sub(balls_lost);
            }
        }
        Ok(())
    }
}

/// Bounces a descending ball off the paddle, steering by hit offset.
pub struct PaddleBounce {
    position_id: ComponentTypeID,
    velocity_id: ComponentTypeID,
    ball_id: ComponentTypeID,
    paddle_id: ComponentTypeID,
    ball_query: Option<QuerySystem>,
    paddle_query: Option<QuerySystem>,
}

impl PaddleBounce {
    pub fn new() -> Self {
        Self {
            position_id: 0,
            velocity_id: 0,
            ball_id: 0,
            paddle_id: 0,
            ball_query: None,
            paddle_query: None,
        }
    }
}

impl System for PaddleBounce {
    fn name(&self) -> &str {
        "ball::paddle_bounce"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["ball::wall_bounce"]
    }

    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        self.position_id = app.world.registry().get::<Position>()?;
        self.velocity_id = app.world.registry().get::<Velocity>()?;
        self.ball_id = app.world.registry().get::<Ball>()?;
        self.paddle_id = app.world.registry().get::<Paddle>()?;
        self.ball_query = Some(QuerySystem::new(vec![
            self.position_id,
            self.velocity_id,
            self.ball_id,
        ]));
        self.paddle_query = Some(QuerySystem::new(vec![self.position_id, self.paddle_id]));
        Ok(())
    }

    fn update(&mut self, app: &mut App, _dt: f64) -> EcsResult<()> {
        let (Some(ball_query), Some(paddle_query)) =
            (self.ball_query.as_mut(), self.paddle_query.as_mut())
        else {
            return Ok(());
        };

        // Paddle geometry first; the playfield has exactly one paddle.
        let paddle_rows = paddle_query.query(&app.world);
        let Some(paddle_row) = paddle_rows.first() else {
            return Ok(());
        };
        let (paddle_x, paddle_y, paddle_half_width) = unsafe {
            let position = paddle_row.get::<Position>(self.position_id).expect("position cell");
            let paddle = paddle_row.get::<Paddle>(self.paddle_id).expect("paddle cell");
            (position.x, position.y, paddle.half_width)
        };

        for row in ball_query.query(&app.world) {
            unsafe {
                let ball = row.get::<Ball>(self.ball_id).expect("ball cell");
                let velocity = row.get_mut::<Velocity>(self.velocity_id).expect("velocity cell");
                let position = row.get_mut::<Position>(self.position_id).expect("position cell");

                let descending = velocity.dy < 0.0;
                let overlaps_x = (position.x - paddle_x).abs() <= paddle_half_width + ball.radius;
                let at_paddle_height = position.y - ball.radius <= paddle_y + ball.radius
                    && position.y > paddle_y;

                if descending && overlaps_x && at_paddle_height {
                    velocity.dy = velocity.dy.abs();
                    // Steer outward proportionally to the contact offset.
                    let offset = (position.x - paddle_x) / paddle_half_width;
                    velocity.dx += offset * 30.0;
                    position.y = paddle_y + ball.radius * 2.0;
                }
            }
        }
        Ok(())
    }
}

/// Damages bricks hit by the ball, reflecting it and scoring destroyed
/// bricks. Despawns happen after all pointer iteration is done.
pub struct BrickCollision {
    position_id: ComponentTypeID,
    velocity_id: ComponentTypeID,
    ball_id: ComponentTypeID,
    brick_id: ComponentTypeID,
    ball_query: Option<QuerySystem>,
    brick_query: Option<QuerySystem>,
}

impl BrickCollision {
    pub fn new() -> Self {
        Self {
            position_id: 0,
            velocity_id: 0,
            ball_id: 0,
            brick_id: 0,
            ball_query: None,
            brick_query: None,
        }
    }
}

impl System for BrickCollision {
    fn name(&self) -> &str {
        "brick::collision"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["ball::paddle_bounce"]
    }

    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        self.position_id = app.world.registry().get::<Position>()?;
        self.velocity_id = app.world.registry().get::<Velocity>()?;
        self.ball_id = app.world.registry().get::<Ball>()?;
        self.brick_id = app.world.registry().get::<Brick>()?;
        self.ball_query = Some(QuerySystem::new(vec![
            self.position_id,
            self.velocity_id,
            self.ball_id,
        ]));
        self.brick_query = Some(QuerySystem::new(vec![self.position_id, self.brick_id]));
        Ok(())
    }

    fn update(&mut self, app: &mut App, _dt: f64) -> EcsResult<()> {
        let (Some(ball_query), Some(brick_query)) =
            (self.ball_query.as_mut(), self.brick_query.as_mut())
        else {
            return Ok(());
        };

        let mut destroyed: Vec<EntityHandle> = Vec::new();

        // Single ball assumed per playfield; read its state once.
        let ball_rows = ball_query.query(&app.world);
        let Some(ball_row) = ball_rows.first() else {
            return Ok(());
        };

        unsafe {
            let ball = ball_row.get::<Ball>(self.ball_id).expect("ball cell");
            let ball_velocity =
                ball_row.get_mut::<Velocity>(self.velocity_id).expect("velocity cell");
            let ball_position =
                ball_row.get_mut::<Position>(self.position_id).expect("position cell");

            for brick_row in brick_query.query(&app.world) {
                let brick = brick_row.get_mut::<Brick>(self.brick_id).expect("brick cell");
                let brick_position =
                    brick_row.get::<Position>(self.position_id).expect("position cell");

                let overlaps_x = (ball_position.x - brick_position.x).abs()
                    <= brick.half_width + ball.radius;
                let overlaps_y = (ball_position.y - brick_position.y).abs()
                    <= brick.half_height + ball.radius;
                if !(overlaps_x && overlaps_y) {
                    continue;
                }

                brick.hits_left -= 1;
                ball_velocity.dy = -ball_velocity.dy;
                if brick.hits_left <= 0 {
                    destroyed.push(brick_row.entity());
                }

                // One brick per frame keeps the reflection well-defined.
                break;
            }
        }

        // Structural mutation only after every pointer is dead.
        let destroyed_count = destroyed.len() as u32;
        for brick in destroyed {
            app.world.despawn(brick);
        }
        if destroyed_count > 0 {
            if let Some(score) = app.resources.get_mut::<Score>() {
                score.points += destroyed_count * 10;
            }
        }
        Ok(())
    }
}

/// Refreshes the HUD summary during the render stage.
pub struct HudRefresh {
    position_id: ComponentTypeID,
    brick_id: ComponentTypeID,
    brick_query: Option<QuerySystem>,
}

impl HudRefresh {
    pub fn new() -> Self {
        Self { position_id: 0, brick_id: 0, brick_query: None }
    }
}

impl System for HudRefresh {
    fn name(&self) -> &str {
        "hud::refresh"
    }

    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        self.position_id = app.world.registry().get::<Position>()?;
        self.brick_id = app.world.registry().get::<Brick>()?;
        self.brick_query = Some(QuerySystem::new(vec![self.position_id, self.brick_id]));
        Ok(())
    }

    fn update(&mut self, app: &mut App, _dt: f64) -> EcsResult<()> {
        let Some(brick_query) = self.brick_query.as_mut() else {
            return Ok(());
        };
        let bricks_remaining = brick_query.count(&app.world);
        let points = app.resources.get::<Score>().map(|s| s.points).unwrap_or(0);

        if let Some(hud) = app.resources.get_mut::<Hud>() {
            hud.bricks_remaining = bricks_remaining;
            hud.points = points;
        }
        Ok(())
    }
}

/// Registers components, spawns the playfield, and wires every system.
pub struct BreakoutPlugin;

impl Plugin for BreakoutPlugin {
    fn name(&self) -> &str {
        "breakout"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["time", "input"]
    }

    fn build(&mut self, app: &mut App) -> EcsResult<()> {
        app.world.register::<Position>()?;
        app.world.register::<Velocity>()?;
        app.world.register::<Paddle>()?;
        app.world.register::<Ball>()?;
        app.world.register::<Brick>()?;

        app.insert_resource(Score::default());
        app.insert_resource(Lives { remaining: 3 });
        app.insert_resource(Hud::default());

        // Paddle at the bottom centre.
        app.world.create_with_components(vec![
            app.world.component(Position { x: 100.0, y: 10.0 })?,
            app.world.component(Paddle { half_width: 15.0 })?,
        ])?;

        // Serve the ball.
        app.world.create_with_components(vec![
            app.world.component(Position { x: BALL_START.0, y: BALL_START.1 })?,
            app.world.component(Velocity { dx: BALL_VELOCITY.0, dy: BALL_VELOCITY.1 })?,
            app.world.component(Ball { radius: 2.0 })?,
        ])?;

        // One row of bricks near the top.
        for i in 0..BRICK_COUNT {
            let x = 20.0 + i as f32 * 40.0;
            app.world.create_with_components(vec![
                app.world.component(Position { x, y: BRICK_ROW_Y })?,
                app.world.component(Brick {
                    hits_left: 1,
                    half_width: 8.0,
                    half_height: 4.0,
                })?,
            ])?;
        }

        app.add_system(PaddleControl::new(), Stage::Update)?;
        app.add_system(BallMovement::new(), Stage::Update)?;
        app.add_system(WallBounce::new(), Stage::PostUpdate)?;
        app.add_system(PaddleBounce::new(), Stage::PostUpdate)?;
        app.add_system(BrickCollision::new(), Stage::PostUpdate)?;
        app.add_system(HudRefresh::new(), Stage::Render)?;

        // A cleanup-stage observer keeping the frame loop honest.
        app.add_system(
            FnSystem::new("field::sanity", |app: &mut App, _| {
                let alive = app.world.entity_count();
                if alive == 0 {
                    return Err(lattice_ecs::EcsError::system_failure(
                        "field::sanity",
                        "playfield lost every entity",
                    ));
                }
                Ok(())
            }),
            Stage::Cleanup,
        )?;

        Ok(())
    }
}
