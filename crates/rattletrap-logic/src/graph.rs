//! Vehicles joined by power cables.
//!
//! A POWER_TRANSFER part remembers the absolute position of its far end.
//! Charge and discharge requests that one vehicle cannot satisfy spill over
//! the cables breadth-first; every hop adds the cable's `transfer_loss`
//! percent to the running path loss.
//!
//! The logic crate does not own a vehicle collection, so traversal goes
//! through [`VehicleGraph`]. [`Standalone`] adapts a single vehicle.

use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

use crate::constants::{flags, fuels};
use crate::mount::MountRefusal;
use crate::part::CableTarget;
use crate::point::{Point, Tripoint};
use crate::power::{epower_to_power, Ambient, EpowerTally};
use crate::vehicle::Vehicle;
use crate::world::{Item, Map, Messages};

/// Lookup of vehicles by world position.
pub trait VehicleGraph {
    type Handle: Copy + Eq + Hash + Debug;

    /// The vehicle with a part at `pos`.
    fn find_vehicle(&self, pos: Tripoint) -> Option<Self::Handle>;

    /// Run `f` against the vehicle behind `handle`. None if it is gone.
    fn with_vehicle<R>(&mut self, handle: Self::Handle, f: impl FnOnce(&mut Vehicle) -> R)
        -> Option<R>;
}

/// A graph of one vehicle. Cables leading elsewhere go nowhere.
pub struct Standalone<'a>(pub &'a mut Vehicle);

impl VehicleGraph for Standalone<'_> {
    type Handle = ();

    fn find_vehicle(&self, pos: Tripoint) -> Option<()> {
        self.0.part_at_global(pos).map(|_| ())
    }

    fn with_vehicle<R>(&mut self, _: (), f: impl FnOnce(&mut Vehicle) -> R) -> Option<R> {
        Some(f(self.0))
    }
}

impl Vehicle {
    /// (far end, loss percent) of every intact cable on this vehicle.
    pub fn power_cables(&self) -> Vec<(Tripoint, i32)> {
        self.loose_parts()
            .iter()
            .filter(|&&p| self.parts[p].has_flag(flags::POWER_TRANSFER))
            .filter_map(|&p| {
                let part = &self.parts[p];
                part.target.map(|t| (t.remote, part.info.transfer_loss))
            })
            .collect()
    }

    /// Run one turn of the electrical balance with no cable neighbours.
    pub fn power_parts(
        &mut self,
        ambient: Ambient,
        rng: &mut impl Rng,
        msgs: &mut dyn Messages,
    ) -> EpowerTally {
        power_parts(&mut Standalone(self), (), ambient, rng, msgs).unwrap_or_default()
    }
}

/// Visit every vehicle reachable over cables from `start`, nearest first.
///
/// `action(vehicle, amount, lost)` receives the amount still outstanding and
/// the share of it lost on the path so far, and returns the new outstanding
/// amount. Each vehicle is visited at most once; traversal stops once less
/// than one unit is outstanding. Returns the final amount.
pub fn traverse_vehicle_graph<G, F>(graph: &mut G, start: G::Handle, amount: i64, mut action: F) -> i64
where
    G: VehicleGraph,
    F: FnMut(&mut Vehicle, i64, i64) -> i64,
{
    let mut amount = amount;
    if amount < 1 {
        return amount;
    }
    let mut queue = VecDeque::from([(start, 0i64)]);
    let mut visited = HashSet::from([start]);

    while let Some((current, loss)) = queue.pop_front() {
        let cables = graph
            .with_vehicle(current, |v| v.power_cables())
            .unwrap_or_default();
        for (remote, transfer_loss) in cables {
            let Some(target) = graph.find_vehicle(remote) else {
                continue;
            };
            if !visited.insert(target) {
                continue;
            }
            let target_loss = loss + transfer_loss as i64;
            queue.push_back((target, target_loss));

            let lost = amount * target_loss / 100;
            amount = graph
                .with_vehicle(target, |v| action(v, amount, lost))
                .unwrap_or(amount);
            log::trace!("{target:?}: {amount} outstanding after visit, path loss {target_loss}%");
            if amount < 1 {
                return amount;
            }
        }
    }
    amount
}

/// Charge `start`'s batteries, then those of connected vehicles. Energy
/// lost in the cables is gone. Returns what fit nowhere.
pub fn charge_network<G: VehicleGraph>(graph: &mut G, start: G::Handle, amount: i64) -> i64 {
    let left = graph
        .with_vehicle(start, |v| v.charge_battery(amount))
        .unwrap_or(amount);
    if left < 1 {
        return left.max(0);
    }
    traverse_vehicle_graph(graph, start, left, |v, amount, lost| {
        v.charge_battery(amount - lost)
    })
}

/// Draw from `start`'s batteries, then from connected ones. Remote
/// vehicles supply the path loss on top. Returns the unmet demand.
pub fn discharge_network<G: VehicleGraph>(graph: &mut G, start: G::Handle, amount: i64) -> i64 {
    let unmet = graph
        .with_vehicle(start, |v| v.discharge_battery(amount))
        .unwrap_or(amount);
    if unmet < 1 {
        return unmet.max(0);
    }
    traverse_vehicle_graph(graph, start, unmet, |v, amount, lost| {
        v.discharge_battery(amount + lost)
    })
}

/// Battery charge reachable from `start`, ignoring cable loss.
pub fn network_battery_left<G: VehicleGraph>(graph: &mut G, start: G::Handle) -> i64 {
    let own = graph
        .with_vehicle(start, |v| v.fuel_left(fuels::BATTERY))
        .unwrap_or(0);
    // Seed with one extra unit so an empty start vehicle still traverses.
    traverse_vehicle_graph(graph, start, own + 1, |v, amount, _| {
        amount + v.fuel_left(fuels::BATTERY)
    }) - 1
}

/// Battery capacity reachable from `start`.
pub fn network_battery_capacity<G: VehicleGraph>(graph: &mut G, start: G::Handle) -> i64 {
    let own = graph
        .with_vehicle(start, |v| v.fuel_capacity(fuels::BATTERY))
        .unwrap_or(0);
    traverse_vehicle_graph(graph, start, own + 1, |v, amount, _| {
        amount + v.fuel_capacity(fuels::BATTERY)
    }) - 1
}

/// One turn of the electrical balance for `start`.
///
/// Tallies producers and consumers, lets reactors top up, then settles the
/// difference against the battery network. On a shortfall loads are shed
/// through [`Vehicle::battery_failure`]. Returns None if `start` is gone.
pub fn power_parts<G, R>(
    graph: &mut G,
    start: G::Handle,
    ambient: Ambient,
    rng: &mut R,
    msgs: &mut dyn Messages,
) -> Option<EpowerTally>
where
    G: VehicleGraph,
    R: Rng,
{
    let mut tally = graph.with_vehicle(start, |v| {
        let tally = v.epower_tally(ambient);
        let epower = v.run_reactors(tally.epower, &mut *rng, msgs);
        EpowerTally { epower, ..tally }
    })?;

    let units = epower_to_power(tally.epower, rng) as i64;
    if units > 0 {
        charge_network(graph, start, units);
    } else if units < 0 {
        let unmet = discharge_network(graph, start, -units);
        if unmet > 0 {
            graph.with_vehicle(start, |v| v.battery_failure(tally.engine_epower, msgs));
            tally.epower = 0;
        }
    }
    Some(tally)
}

/// Drop every UNMOUNT_ON_MOVE part of `start` on the ground. Cables are
/// pulled out at the far end too.
pub fn shed_loose_parts<G: VehicleGraph>(graph: &mut G, start: G::Handle, map: &mut dyn Map) {
    let cables = graph
        .with_vehicle(start, |v| {
            v.loose_parts()
                .iter()
                .filter(|&&p| v.part_flag(p, flags::POWER_TRANSFER))
                .filter_map(|&p| v.part(p).target.map(|t| (v.global_part_pos(p), t.remote)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    for (here, remote) in cables {
        let Some(other) = graph.find_vehicle(remote) else {
            continue;
        };
        if other == start {
            continue;
        }
        graph.with_vehicle(other, |rv| {
            let plug = rv.loose_parts().iter().copied().find(|&p| {
                rv.part_flag(p, flags::POWER_TRANSFER)
                    && rv.part(p).target.is_some_and(|t| t.remote == here)
            });
            if let Some(plug) = plug {
                rv.remove_part(plug, map);
                rv.part_removal_cleanup();
            }
        });
    }

    graph.with_vehicle(start, |v| {
        while let Some(&p) = v.loose_parts().first() {
            let pos = v.global_part_pos(p);
            map.add_item(pos, Item::new(v.part(p).info.item.clone()));
            v.remove_part(p, map);
        }
        v.part_removal_cleanup();
    });
}

/// Install a cable between `a` and `b`, each given as a vehicle and mount.
pub fn connect_cable<G: VehicleGraph>(
    graph: &mut G,
    a: (G::Handle, Point),
    b: (G::Handle, Point),
    cable_id: &str,
) -> Result<(), MountRefusal> {
    let locate = |graph: &mut G, (h, mount): (G::Handle, Point)| {
        graph
            .with_vehicle(h, |v| -> Result<Tripoint, MountRefusal> {
                let info = v
                    .registry()
                    .get(cable_id)
                    .cloned()
                    .ok_or_else(|| MountRefusal::UnknownPart(cable_id.to_string()))?;
                v.can_mount(mount, &info)?;
                Ok(v.pos + mount.rotated(v.face))
            })
            .unwrap_or(Err(MountRefusal::NeedsFrame))
    };
    let a_pos = locate(graph, a)?;
    let b_pos = locate(graph, b)?;

    for ((h, mount), local, remote) in [(a, a_pos, b_pos), (b, b_pos, a_pos)] {
        graph
            .with_vehicle(h, |v| -> Result<(), MountRefusal> {
                let p = v.install_part(mount, cable_id)?;
                v.part_mut(p).target = Some(CableTarget { local, remote });
                Ok(())
            })
            .unwrap_or(Err(MountRefusal::NeedsFrame))?;
    }
    log::debug!("cable connected {a_pos:?} <-> {b_pos:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{registry, straight_line, TestWorld};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Vehicles indexed by position in a Vec.
    struct Yard(Vec<Vehicle>);

    impl VehicleGraph for Yard {
        type Handle = usize;

        fn find_vehicle(&self, pos: Tripoint) -> Option<usize> {
            self.0.iter().position(|v| v.part_at_global(pos).is_some())
        }

        fn with_vehicle<R>(&mut self, h: usize, f: impl FnOnce(&mut Vehicle) -> R) -> Option<R> {
            self.0.get_mut(h).map(f)
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Two frames with a car battery on each, parked at `x`.
    fn bank(x: i32, charge: i64) -> Vehicle {
        let mut v = Vehicle::new(registry(), format!("bank{x}"));
        for m in [Point::ZERO, Point::new(1, 0)] {
            v.install_part(m, "frame").unwrap();
        }
        let b = v.install_part(Point::ZERO, "battery_car").unwrap();
        v.part_mut(b).ammo_set(fuels::BATTERY, charge);
        v.pos = Tripoint::new(x, 0, 0);
        v
    }

    fn cable(yard: &mut Yard, a: usize, am: i32, b: usize, bm: i32) {
        connect_cable(yard, (a, Point::new(am, 0)), (b, Point::new(bm, 0)), "jumper_cable").unwrap();
    }

    fn pair(a_charge: i64, b_charge: i64) -> Yard {
        let mut yard = Yard(vec![bank(0, a_charge), bank(10, b_charge)]);
        cable(&mut yard, 0, 1, 1, 0);
        yard
    }

    // ── Traversal ───────────────────────────────────────────────────────

    #[test]
    fn test_connect_sets_both_ends() {
        let yard = pair(0, 0);
        let a = &yard.0[0];
        let b = &yard.0[1];
        assert_eq!(a.power_cables(), vec![(Tripoint::new(10, 0, 0), 10)]);
        assert_eq!(b.power_cables(), vec![(Tripoint::new(1, 0, 0), 10)]);
    }

    #[test]
    fn test_connect_needs_frame() {
        let mut yard = Yard(vec![bank(0, 0), bank(10, 0)]);
        let err = connect_cable(&mut yard, (0, Point::new(5, 5)), (1, Point::ZERO), "jumper_cable");
        assert_eq!(err, Err(MountRefusal::NeedsFrame));
        assert!(yard.0[1].loose_parts().is_empty());
    }

    #[test]
    fn test_charge_spills_over_with_loss() {
        let mut yard = pair(1000, 0);
        assert_eq!(charge_network(&mut yard, 0, 100), 0);
        // 10% lost in the cable.
        assert_eq!(yard.0[1].battery_left(), 90);
    }

    #[test]
    fn test_discharge_remote_pays_loss() {
        let mut yard = pair(0, 500);
        assert_eq!(discharge_network(&mut yard, 0, 100), 0);
        assert_eq!(yard.0[1].battery_left(), 390);
    }

    #[test]
    fn test_discharge_more_than_network_holds() {
        let mut yard = pair(50, 100);
        let unmet = discharge_network(&mut yard, 0, 300);
        // Local 50 covers part, remote owes 250 + 25 and has 100.
        assert_eq!(unmet, 175);
        assert_eq!(yard.0[0].battery_left(), 0);
        assert_eq!(yard.0[1].battery_left(), 0);
    }

    #[test]
    fn test_cycle_visits_each_vehicle_once() {
        let mut yard = Yard(vec![bank(0, 100), bank(10, 200), bank(20, 300)]);
        cable(&mut yard, 0, 0, 1, 0);
        cable(&mut yard, 1, 1, 2, 0);
        cable(&mut yard, 2, 1, 0, 1);
        let mut visits = Vec::new();
        traverse_vehicle_graph(&mut yard, 0, 1000, |v, amount, _| {
            visits.push(v.name.clone());
            amount
        });
        visits.sort();
        assert_eq!(visits, vec!["bank10".to_string(), "bank20".to_string()]);
        assert_eq!(network_battery_left(&mut yard, 0), 600);
        assert_eq!(network_battery_capacity(&mut yard, 0), 3000);
    }

    #[test]
    fn test_loss_accumulates_along_path() {
        let mut yard = Yard(vec![bank(0, 0), bank(10, 0), bank(20, 0)]);
        cable(&mut yard, 0, 0, 1, 0);
        cable(&mut yard, 1, 1, 2, 0);
        let mut losses = Vec::new();
        traverse_vehicle_graph(&mut yard, 0, 1000, |_, amount, lost| {
            losses.push(lost);
            amount
        });
        assert_eq!(losses, vec![100, 200]);
    }

    #[test]
    fn test_traversal_stops_when_satisfied() {
        let mut yard = Yard(vec![bank(0, 0), bank(10, 1000), bank(20, 1000)]);
        cable(&mut yard, 0, 0, 1, 0);
        cable(&mut yard, 1, 1, 2, 0);
        discharge_network(&mut yard, 0, 50);
        assert_eq!(yard.0[2].battery_left(), 1000);
    }

    #[test]
    fn test_empty_start_still_counts_network() {
        let mut yard = pair(0, 700);
        assert_eq!(network_battery_left(&mut yard, 0), 700);
    }

    // ── Power turn ──────────────────────────────────────────────────────

    #[test]
    fn test_power_parts_reactor_charges_battery() {
        let mut v = straight_line(2);
        v.install_part(Point::ZERO, "battery_car").unwrap();
        let r = v.install_part(Point::new(1, 0), "reactor_perpetual").unwrap();
        v.set_part_enabled(r, true);
        let mut world = TestWorld::default();
        let mut rng = StdRng::seed_from_u64(3);

        let tally = v.power_parts(Ambient::default(), &mut rng, &mut world);
        assert_eq!(tally.epower, 1865);
        // 1865 W is exactly five units.
        assert_eq!(v.battery_left(), 5);
    }

    #[test]
    fn test_power_parts_deficit_sheds_loads() {
        let mut v = straight_line(3);
        v.install_part(Point::ZERO, "battery_car").unwrap();
        let lights: Vec<usize> = (0..3)
            .map(|x| v.install_part(Point::new(x, 0), "headlight").unwrap())
            .collect();
        for &l in &lights {
            v.set_part_enabled(l, true);
        }
        let mut world = TestWorld::default();
        let mut rng = StdRng::seed_from_u64(3);

        v.power_parts(Ambient::default(), &mut rng, &mut world);
        assert!(world.saw_message("battery dies"));
        assert!(lights.iter().all(|&l| !v.part(l).enabled));
    }

    #[test]
    fn test_power_parts_draws_from_neighbour() {
        let mut yard = pair(0, 1000);
        let light = yard.0[0].install_part(Point::ZERO, "headlight").unwrap();
        yard.0[0].set_part_enabled(light, true);
        let light2 = yard.0[0].install_part(Point::new(1, 0), "headlight").unwrap();
        yard.0[0].set_part_enabled(light2, true);
        let mut world = TestWorld::default();
        let mut rng = StdRng::seed_from_u64(11);

        power_parts(&mut yard, 0, Ambient::default(), &mut rng, &mut world).unwrap();
        assert!(!world.saw_message("battery dies"));
        assert!(yard.0[0].part(light).enabled);
        assert!(yard.0[1].battery_left() < 1000);
    }

    // ── Shedding ────────────────────────────────────────────────────────

    #[test]
    fn test_shed_pulls_both_ends() {
        let mut yard = pair(0, 0);
        let mut world = TestWorld::default();
        shed_loose_parts(&mut yard, 0, &mut world);
        assert!(yard.0[0].loose_parts().is_empty());
        assert!(yard.0[1].loose_parts().is_empty());
        assert_eq!(world.items_at(Tripoint::new(1, 0, 0)), vec!["jumper_cable".to_string()]);
        assert!(yard.0.iter().all(|v| v.power_cables().is_empty()));
    }
}
