//! Plain-data components and resources for the headless breakout scenario.

/// World-space position in playfield units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Velocity in playfield units per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

/// The player-controlled paddle, centred on its `Position`.
#[derive(Clone, Copy, Debug)]
pub struct Paddle {
    pub half_width: f32,
}

/// The bouncing ball.
#[derive(Clone, Copy, Debug)]
pub struct Ball {
    pub radius: f32,
}

/// A destructible brick, centred on its `Position`.
#[derive(Clone, Copy, Debug)]
pub struct Brick {
    pub hits_left: i32,
    pub half_width: f32,
    pub half_height: f32,
}

/// Accumulated points. One brick is worth ten.
#[derive(Clone, Copy, Debug, Default)]
pub struct Score {
    pub points: u32,
}

/// Remaining balls before the run ends.
#[derive(Clone, Copy, Debug)]
pub struct Lives {
    pub remaining: u32,
}

/// Per-frame summary refreshed during the render stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hud {
    pub bricks_remaining: usize,
    pub points: u32,
}
