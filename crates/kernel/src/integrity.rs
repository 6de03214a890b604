use std::collections::HashSet;
use std::fmt;

use realmkeep_common::{ObjectId, Pos4d, ZoneCoord};
use realmkeep_zone::ZoneKind;

use crate::world::WorldState;

/// One inconsistency found by [`WorldState::integrity_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// A zone lists a handle the object table no longer knows.
    Dangling {
        realm: String,
        zone: ZoneCoord,
        kind: ZoneKind,
        id: ObjectId,
    },
    /// The object's live position maps to another zone (or realm, or off the map).
    Misplaced {
        realm: String,
        zone: ZoneCoord,
        kind: ZoneKind,
        id: ObjectId,
        pos: Pos4d,
        expected: Option<ZoneCoord>,
    },
    /// The handle is listed under a kind that does not match the object.
    WrongKind {
        realm: String,
        zone: ZoneCoord,
        listed: ZoneKind,
        actual: ZoneKind,
        id: ObjectId,
    },
    /// The object sits inside a container but is still listed in a zone.
    Contained {
        realm: String,
        zone: ZoneCoord,
        id: ObjectId,
        container: ObjectId,
    },
    /// The same handle is listed more than once.
    Duplicate {
        realm: String,
        zone: ZoneCoord,
        kind: ZoneKind,
        id: ObjectId,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::Dangling { realm, zone, kind, id } => write!(
                f,
                "{} {id} in zone {zone} of '{realm}' is not in the object table",
                kind.label()
            ),
            IntegrityIssue::Misplaced {
                realm,
                zone,
                kind,
                id,
                pos,
                expected,
            } => match expected {
                Some(expected) => write!(
                    f,
                    "{} {id} in zone {zone} of '{realm}' but location is {pos} (zone {expected})",
                    kind.label()
                ),
                None => write!(
                    f,
                    "{} {id} in zone {zone} of '{realm}' but location {pos} is off the map",
                    kind.label()
                ),
            },
            IntegrityIssue::WrongKind {
                realm,
                zone,
                listed,
                actual,
                id,
            } => write!(
                f,
                "{id} listed as {} in zone {zone} of '{realm}' but is a {}",
                listed.label(),
                actual.label()
            ),
            IntegrityIssue::Contained {
                realm,
                zone,
                id,
                container,
            } => write!(
                f,
                "{id} in zone {zone} of '{realm}' is inside container {container}"
            ),
            IntegrityIssue::Duplicate { realm, zone, kind, id } => write!(
                f,
                "{} {id} listed again in zone {zone} of '{realm}'",
                kind.label()
            ),
        }
    }
}

/// Result of a full-world zone audit.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub zones_checked: usize,
    pub handles_checked: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integrity: zones={} handles={} issues={}",
            self.zones_checked,
            self.handles_checked,
            self.issues.len()
        )
    }
}

impl WorldState {
    /// Recompute every listed object's zone from its live position and report
    /// every mismatch. Read-only.
    pub fn integrity_check(&self) -> IntegrityReport {
        let _span = tracing::info_span!("integrity_check").entered();
        let mut report = IntegrityReport::default();
        let mut seen: HashSet<ObjectId> = HashSet::new();

        for realm in &self.realms {
            for (coord, zone) in realm.grid().iter() {
                report.zones_checked += 1;
                for kind in ZoneKind::ALL {
                    for &id in zone.list(kind) {
                        report.handles_checked += 1;
                        let name = || realm.name().to_string();
                        if !seen.insert(id) {
                            report.issues.push(IntegrityIssue::Duplicate {
                                realm: name(),
                                zone: coord,
                                kind,
                                id,
                            });
                            continue;
                        }
                        let Some(object) = self.objects.get(&id) else {
                            report.issues.push(IntegrityIssue::Dangling {
                                realm: name(),
                                zone: coord,
                                kind,
                                id,
                            });
                            continue;
                        };
                        let actual = object.kind.zone_kind();
                        if actual != kind {
                            report.issues.push(IntegrityIssue::WrongKind {
                                realm: name(),
                                zone: coord,
                                listed: kind,
                                actual,
                                id,
                            });
                        }
                        if let Some(container) = object.container {
                            report.issues.push(IntegrityIssue::Contained {
                                realm: name(),
                                zone: coord,
                                id,
                                container,
                            });
                        }
                        let expected = if object.pos.realm == realm.id() {
                            realm.zone_for(object.pos.xy())
                        } else {
                            None
                        };
                        if expected != Some(coord) {
                            report.issues.push(IntegrityIssue::Misplaced {
                                realm: name(),
                                zone: coord,
                                kind,
                                id,
                                pos: object.pos,
                                expected,
                            });
                        }
                    }
                }
            }
        }

        for issue in &report.issues {
            tracing::error!(%issue, "zone integrity problem");
        }
        tracing::info!(
            zones = report.zones_checked,
            handles = report.handles_checked,
            issues = report.issues.len(),
            "integrity check complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::WorldObject;
    use realmkeep_common::RealmId;
    use realmkeep_decay::DecayConfig;
    use realmkeep_zone::RealmConfig;

    fn world() -> WorldState {
        let realms = [RealmConfig {
            name: "test".to_string(),
            width: 256,
            height: 256,
        }];
        WorldState::new(&realms, DecayConfig::default()).unwrap()
    }

    fn at(x: u16, y: u16) -> Pos4d {
        Pos4d::new(x, y, 0, RealmId(0))
    }

    #[test]
    fn empty_world_passes() {
        let report = world().integrity_check();
        assert!(report.is_ok());
        assert_eq!(report.zones_checked, 16);
        assert_eq!(report.handles_checked, 0);
    }

    #[test]
    fn populated_world_passes() {
        let mut w = world();
        for i in 0..20u16 {
            w.create_item(1, at(i * 12, 255 - i * 12)).unwrap();
        }
        let npc = w.allocate_id().unwrap();
        w.spawn(WorldObject::npc(npc, 0x190, at(200, 30))).unwrap();
        let report = w.integrity_check();
        assert!(report.is_ok(), "{:?}", report.issues);
        assert_eq!(report.handles_checked, 21);
    }

    #[test]
    fn stale_position_is_flagged_without_repair() {
        let mut w = world();
        let id = w.create_item(1, at(10, 10)).unwrap();
        w.object_mut(id).unwrap().pos = at(100, 10);

        let report = w.integrity_check();
        assert_eq!(
            report.issues,
            vec![IntegrityIssue::Misplaced {
                realm: "test".to_string(),
                zone: ZoneCoord::new(0, 0),
                kind: ZoneKind::Item,
                id,
                pos: at(100, 10),
                expected: Some(ZoneCoord::new(1, 0)),
            }]
        );
        // Diagnostic only: the handle stays where it was.
        assert!(w.realms()[0]
            .zone(ZoneCoord::new(0, 0))
            .unwrap()
            .items
            .contains(&id));
    }

    #[test]
    fn dangling_handles_are_flagged() {
        let mut w = world();
        let id = w.create_item(1, at(10, 10)).unwrap();
        w.objects.remove(&id);
        let report = w.integrity_check();
        assert!(matches!(
            report.issues.as_slice(),
            [IntegrityIssue::Dangling { .. }]
        ));
    }

    #[test]
    fn issue_display_names_both_zones() {
        let issue = IntegrityIssue::Misplaced {
            realm: "test".to_string(),
            zone: ZoneCoord::new(0, 0),
            kind: ZoneKind::Item,
            id: ObjectId(0x10),
            pos: at(100, 10),
            expected: Some(ZoneCoord::new(1, 0)),
        };
        let text = issue.to_string();
        assert!(text.contains("[0,0]"));
        assert!(text.contains("[1,0]"));
    }
}
