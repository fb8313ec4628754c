use std::time::Duration;

use crate::model::Coordinate;

/// City-scale zoom used for every fly-to.
pub const FLY_ZOOM: u8 = 13;

/// Duration of the camera animation.
pub const FLY_DURATION: Duration = Duration::from_secs(2);

/// An animated camera transition of the map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub target: Coordinate,
    pub zoom: u8,
    pub duration: Duration,
}

impl FlyTo {
    pub fn to(target: Coordinate) -> Self {
        Self { target, zoom: FLY_ZOOM, duration: FLY_DURATION }
    }
}

/// The map widget's camera, driven purely by coordinate changes. Invoked
/// exactly once per non-absent coordinate change; no other side effects.
pub trait CameraFollower: Send {
    fn fly_to(&mut self, command: FlyTo);
}

/// Follower for headless use; logs the transition and does nothing else.
#[derive(Debug, Default)]
pub struct NullCamera;

impl CameraFollower for NullCamera {
    fn fly_to(&mut self, command: FlyTo) {
        tracing::debug!(target = %command.target, zoom = command.zoom, "camera fly-to");
    }
}
