use async_trait::async_trait;

use crate::config::LocationParams;
use crate::error::{FetchError, Result};
use crate::models::Position;

/// Source of the user's position. On a device this wraps the platform
/// location API; the server ships with [`FixedLocationProvider`].
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> bool;

    async fn current_position(&self) -> Result<Position>;
}

/// Answers from configuration: a fixed permission decision and position.
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    permission_granted: bool,
    position: Position,
}

impl FixedLocationProvider {
    pub fn new(permission_granted: bool, position: Position) -> Self {
        FixedLocationProvider {
            permission_granted,
            position,
        }
    }
}

impl From<LocationParams> for FixedLocationProvider {
    fn from(params: LocationParams) -> Self {
        FixedLocationProvider::new(params.permission_granted, params.position())
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> bool {
        self.permission_granted
    }

    async fn current_position(&self) -> Result<Position> {
        if !self.permission_granted {
            return Err(FetchError::PermissionDenied);
        }
        Ok(self.position)
    }
}
