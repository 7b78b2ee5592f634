//! Mount and unmount validation, including the structural cut-vertex check.
//!
//! Both checks return typed refusals rather than errors: a refused install
//! is an ordinary outcome the caller is expected to test for.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::constants::flags;
use crate::part_info::PartInfo;
use crate::point::Point;
use crate::vehicle::Vehicle;

/// Why a part cannot be installed at a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountRefusal {
    UnknownPart(String),
    NotInstallable,
    /// The first part in an empty square must be a frame.
    NeedsFrame,
    OnProtrusion,
    /// Same type already here.
    Duplicate,
    /// Another part already fills this location slot.
    SlotTaken(String),
    TwoCargo,
    NotAdjacent,
    /// The part's flag requires a co-located part with another flag.
    MissingAnchor { needs: &'static str },
    /// Mirrors and opaque parts exclude each other.
    VisionBlocked,
    /// An installed engine shares an exclusion group.
    EngineConflict(String),
}

impl fmt::Display for MountRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountRefusal::UnknownPart(id) => write!(f, "There is no such part as '{id}'."),
            MountRefusal::NotInstallable => write!(f, "This part cannot be installed."),
            MountRefusal::NeedsFrame => write!(f, "A frame must be installed here first."),
            MountRefusal::OnProtrusion => write!(f, "Nothing can be mounted on a protrusion."),
            MountRefusal::Duplicate => write!(f, "That part is already installed here."),
            MountRefusal::SlotTaken(loc) => write!(f, "The {loc} slot is already taken."),
            MountRefusal::TwoCargo => write!(f, "Only one cargo space fits in a square."),
            MountRefusal::NotAdjacent => write!(f, "Must be installed next to the frame."),
            MountRefusal::MissingAnchor { needs } => {
                write!(f, "Needs a part with {needs} in the same square.")
            }
            MountRefusal::VisionBlocked => write!(f, "Mirrors cannot go on opaque parts."),
            MountRefusal::EngineConflict(kind) => {
                write!(f, "Conflicts with an installed {kind} engine.")
            }
        }
    }
}

/// Why a part cannot be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmountRefusal {
    AlternatorAttached,
    SeatbeltAttached,
    CurtainAttached,
    ControlsInUse,
    BatteryOnMount,
    TurretAttached,
    AnimalInside,
    /// Frames go last: other parts in the square must be removed first.
    OtherPartsAttached,
    /// The frame is a cut vertex of the structural graph.
    WouldSplit,
}

impl fmt::Display for UnmountRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnmountRefusal::AlternatorAttached => "Remove attached alternator first.",
            UnmountRefusal::SeatbeltAttached => "Remove attached seatbelt first.",
            UnmountRefusal::CurtainAttached => "Remove attached curtains first.",
            UnmountRefusal::ControlsInUse => "Remove attached part first.",
            UnmountRefusal::BatteryOnMount => "Remove battery from mount first.",
            UnmountRefusal::TurretAttached => "Remove attached mounted weapon first.",
            UnmountRefusal::AnimalInside => "Remove carried animal first.",
            UnmountRefusal::OtherPartsAttached => "Remove all other attached parts first.",
            UnmountRefusal::WouldSplit => "Removing this part would split the vehicle.",
        };
        f.write_str(text)
    }
}

/// (flag on the part being removed, dependent flag that blocks removal).
const UNMOUNT_BLOCKERS: [(&str, &str, UnmountRefusal); 6] = [
    (flags::ENGINE, flags::ALTERNATOR, UnmountRefusal::AlternatorAttached),
    (flags::BELTABLE, flags::SEATBELT, UnmountRefusal::SeatbeltAttached),
    (flags::WINDOW, flags::CURTAIN, UnmountRefusal::CurtainAttached),
    (flags::CONTROLS, flags::ON_CONTROLS, UnmountRefusal::ControlsInUse),
    (flags::BATTERY_MOUNT, flags::NEEDS_BATTERY_MOUNT, UnmountRefusal::BatteryOnMount),
    (flags::TURRET_MOUNT, flags::TURRET, UnmountRefusal::TurretAttached),
];

impl Vehicle {
    /// Check whether a part of type `info` may be installed at `mount`.
    pub fn can_mount(&self, mount: Point, info: &PartInfo) -> Result<(), MountRefusal> {
        if info.has_flag(flags::NOINSTALL) {
            return Err(MountRefusal::NotInstallable);
        }

        let here = self.parts_at_relative(mount);
        if here.is_empty() && !info.is_structural() {
            return Err(MountRefusal::NeedsFrame);
        }
        if let Some(&first) = here.first() {
            if self.parts[first].has_flag(flags::PROTRUSION) {
                return Err(MountRefusal::OnProtrusion);
            }
        }

        for &i in here {
            let other = &self.parts[i].info;
            if other.id == info.id {
                return Err(MountRefusal::Duplicate);
            }
            if !info.location.is_empty() && info.location == other.location {
                return Err(MountRefusal::SlotTaken(info.location.clone()));
            }
            if info.has_flag(flags::CARGO) && other.has_flag(flags::CARGO) {
                return Err(MountRefusal::TwoCargo);
            }
        }

        // Everything after the first part goes on or next to a frame, unless
        // a frame is mid-replacement.
        if !self.parts.is_empty()
            && !self.is_structural_part_removed()
            && !self.has_structural_part(mount)
            && !mount
                .four_adjacent()
                .iter()
                .any(|&n| self.has_structural_part(n))
        {
            return Err(MountRefusal::NotAdjacent);
        }

        if let Some(kind) = self.engine_conflict(info) {
            return Err(MountRefusal::EngineConflict(kind));
        }

        let has_here = |flag: &str| here.iter().any(|&i| self.parts[i].has_flag(flag));
        for (flag, needs) in flags::MOUNT_ANCHORS {
            if info.has_flag(flag) && !has_here(needs) {
                return Err(MountRefusal::MissingAnchor { needs });
            }
        }

        let is_mirror = |p: &PartInfo| p.has_flag(flags::VISION) && !p.has_flag(flags::CAMERA);
        if is_mirror(info) && has_here(flags::OPAQUE) {
            return Err(MountRefusal::VisionBlocked);
        }
        if info.has_flag(flags::OPAQUE) && here.iter().any(|&i| is_mirror(&self.parts[i].info)) {
            return Err(MountRefusal::VisionBlocked);
        }

        Ok(())
    }

    /// The exclusion group `info` shares with an installed engine, if any.
    pub fn engine_conflict(&self, info: &PartInfo) -> Option<String> {
        if info.engine_excludes.is_empty() {
            return None;
        }
        self.index.engines.iter().find_map(|&e| {
            self.parts[e]
                .info
                .engine_excludes
                .iter()
                .find(|x| info.engine_excludes.contains(x))
                .cloned()
        })
    }

    pub fn has_engine_conflict(&self, info: &PartInfo) -> bool {
        self.engine_conflict(info).is_some()
    }

    /// Check whether part `p` may be removed without orphaning dependents
    /// or splitting the structural graph.
    pub fn can_unmount(&self, p: usize) -> Result<(), UnmountRefusal> {
        let part = &self.parts[p];
        for (flag, dependent, refusal) in UNMOUNT_BLOCKERS {
            if part.has_flag(flag) && self.part_with_feature(p, dependent, false).is_some() {
                return Err(refusal);
            }
        }
        if part.animal.is_some() {
            return Err(UnmountRefusal::AnimalInside);
        }

        if !part.info.is_structural() {
            return Ok(());
        }

        let mount = part.mount;
        let here = self.parts_at_relative(mount);
        if here.iter().any(|&i| !self.parts[i].info.is_structural()) {
            return Err(UnmountRefusal::OtherPartsAttached);
        }
        if here.len() > 1 {
            // Stacked wreckage: another frame keeps the square occupied.
            return Ok(());
        }

        let neighbours: Vec<Point> = mount
            .four_adjacent()
            .into_iter()
            .filter(|&n| !self.parts_at_relative(n).is_empty())
            .collect();
        // Zero neighbours: last square. One: a leaf. Neither can split.
        if let Some((&target, rest)) = neighbours.split_first() {
            for &from in rest {
                if !self.is_connected(target, from, mount) {
                    return Err(UnmountRefusal::WouldSplit);
                }
            }
        }
        Ok(())
    }

    /// Breadth-first search from `from` to `to` over load-bearing frames,
    /// never stepping on `excluded`.
    pub fn is_connected(&self, to: Point, from: Point, excluded: Point) -> bool {
        if from == to {
            return true;
        }
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);
        while let Some(current) = queue.pop_front() {
            for next in current.four_adjacent() {
                if next == to {
                    return true;
                }
                if next == excluded || seen.contains(&next) {
                    continue;
                }
                let load_bearing = self.parts_at_relative(next).first().is_some_and(|&i| {
                    let p = &self.parts[i];
                    !p.removed && p.info.is_structural() && !p.has_flag(flags::PROTRUSION)
                });
                if load_bearing {
                    seen.insert(next);
                    queue.push_back(next);
                }
            }
        }
        false
    }
}
