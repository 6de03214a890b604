use realmkeep_common::{RealmId, ZoneCoord};
use realmkeep_kernel::WorldState;

use crate::driver::DriverError;

/// Grid dimensions of one realm, captured when the cursor is built.
#[derive(Debug, Clone, Copy)]
struct RealmGrid {
    id: RealmId,
    width: u32,
    height: u32,
}

/// Where the cursor landed after one advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorStep {
    pub realm: RealmId,
    pub zone: ZoneCoord,
    /// Moved from the last zone of the last realm back to the first one.
    pub wrapped: bool,
}

/// Round-robin position over every zone of every realm: x first, then y,
/// then the next realm.
#[derive(Debug, Clone)]
pub struct ZoneCursor {
    grids: Vec<RealmGrid>,
    realm: usize,
    x: u32,
    y: u32,
    positioned: bool,
}

impl ZoneCursor {
    pub fn new(world: &WorldState) -> Result<Self, DriverError> {
        let grids: Vec<RealmGrid> = world
            .realms()
            .iter()
            .filter(|r| r.zone_count() > 0)
            .map(|r| RealmGrid {
                id: r.id(),
                width: r.grid_width(),
                height: r.grid_height(),
            })
            .collect();
        if grids.is_empty() {
            return Err(DriverError::MissingRealmGrid);
        }
        Ok(Self {
            grids,
            realm: 0,
            x: 0,
            y: 0,
            positioned: false,
        })
    }

    /// Zones covered by one full cycle.
    pub fn total_zones(&self) -> usize {
        self.grids
            .iter()
            .map(|g| g.width as usize * g.height as usize)
            .sum()
    }

    /// Move to the next zone. The first call lands on the first zone and
    /// never reports a wrap.
    pub fn advance(&mut self) -> CursorStep {
        let mut wrapped = false;
        if !self.positioned {
            self.positioned = true;
        } else {
            self.x += 1;
            if self.x >= self.grids[self.realm].width {
                self.x = 0;
                self.y += 1;
                if self.y >= self.grids[self.realm].height {
                    self.y = 0;
                    self.realm += 1;
                    if self.realm >= self.grids.len() {
                        self.realm = 0;
                        wrapped = true;
                    }
                }
            }
        }
        CursorStep {
            realm: self.grids[self.realm].id,
            zone: ZoneCoord::new(self.x, self.y),
            wrapped,
        }
    }
}
