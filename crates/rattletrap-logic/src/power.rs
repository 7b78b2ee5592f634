//! Engines, fuel and the local electrical balance.
//!
//! Propulsive power is in watts. Electrical power ("epower") is also in
//! watts, but batteries store charge units worth 373 W for one turn;
//! [`epower_to_power`] converts with a stochastic remainder so small loads
//! still drain batteries on average.
//!
//! The cross-vehicle part of the balance (cables, path loss) lives in
//! [`crate::graph`]; everything here touches one vehicle.

use std::collections::BTreeMap;

use rand::Rng;

use crate::constants::{flags, fuels, physics};
use crate::part::Fault;
use crate::vehicle::Vehicle;
use crate::world::{Messages, MsgKind};

/// Strength at which muscle engines give their listed power.
const BASE_STRENGTH: i32 = 8;
/// Stand-in fuel level reported for perpetual sources.
const PERPETUAL_FUEL: i64 = 10;

/// True with probability `x / y`.
pub(crate) fn x_in_y(rng: &mut impl Rng, x: i64, y: i64) -> bool {
    y > 0 && x > 0 && rng.gen_range(0..y) < x
}

/// Convert watts into battery charge units for one turn.
pub fn epower_to_power(epower: i32, rng: &mut impl Rng) -> i32 {
    let unit = physics::WATTS_PER_EPOWER_UNIT;
    let mut power = epower / unit;
    if x_in_y(rng, (epower % unit).abs() as i64, unit as i64) {
        power += if epower >= 0 { 1 } else { -1 };
    }
    power
}

/// Convert battery charge units into watts.
pub fn power_to_epower(power: i32) -> i32 {
    power * physics::WATTS_PER_EPOWER_UNIT
}

/// Environmental inputs to solar panels and wind turbines, each 0..=1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ambient {
    pub sunlight: f64,
    pub wind: f64,
}

/// Result of summing one vehicle's producers and consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpowerTally {
    /// Net watts: positive is surplus.
    pub epower: i32,
    /// Net watts of running engines. Negative means the ignition draws power.
    pub engine_epower: i32,
}

impl Vehicle {
    // ── Engines ─────────────────────────────────────────────────────────

    pub fn is_engine_on(&self, e: usize) -> bool {
        let part = &self.parts[e];
        part.is_available() && part.enabled
    }

    /// An alternator turns while an intact, enabled engine on its mount has
    /// a good belt.
    pub fn is_alternator_on(&self, a: usize) -> bool {
        let alt = &self.parts[a];
        if !alt.is_available() {
            return false;
        }
        self.index.engines.iter().any(|&e| {
            let eng = &self.parts[e];
            eng.enabled && !eng.is_broken() && eng.mount == alt.mount && !eng.has_fault(Fault::Belt)
        })
    }

    pub fn is_perpetual_engine(&self, e: usize) -> bool {
        let info = &self.parts[e].info;
        info.has_flag(flags::PERPETUAL) || self.registry().is_perpetual(&info.fuel_type)
    }

    pub fn engine_has_fuel(&self, e: usize) -> bool {
        self.fuel_left(&self.parts[e].info.fuel_type) > 0
    }

    /// Output of an engine (positive) or load of an alternator (negative).
    ///
    /// Muscle engines add the driver's strength bonus. Damage scales output
    /// down to the part's `damaged_power_factor` floor.
    pub fn part_power(&self, p: usize, at_full_hp: bool) -> i32 {
        let part = &self.parts[p];
        if !part.info.is_engine() && !part.has_flag(flags::ALTERNATOR) {
            return 0;
        }
        let strength = self.driver().map_or(BASE_STRENGTH, |d| d.strength);
        let pwr = part.info.power + (strength - BASE_STRENGTH) * part.info.muscle_power_factor;
        if pwr < 0 || at_full_hp {
            return pwr;
        }
        let dpf = part.info.damaged_power_factor;
        (pwr as f64 * (dpf + (1.0 - dpf) * part.health_percent())) as i32
    }

    /// Electrical output (positive) or draw (negative). Consumers always draw
    /// in full; producers scale with health.
    pub fn part_epower(&self, p: usize) -> i32 {
        let part = &self.parts[p];
        let e = part.info.epower;
        if e < 0 {
            return e;
        }
        (e as f64 * part.health_percent()) as i32
    }

    /// Total propulsive watts.
    ///
    /// `fueled` ignores engines that have run dry. `safe` scales each engine
    /// by its `engine_m2c` efficiency (reduced by a clogged fuel filter).
    /// Alternators subtract their load, and several engines lose efficiency
    /// to coupling: `4 / (4 + n - 1)`.
    pub fn total_power_w(&self, fueled: bool, safe: bool) -> i32 {
        let mut pwr: i64 = 0;
        let mut cnt = 0;
        for &e in &self.index.engines {
            if !self.is_engine_on(e) || (fueled && !self.engine_has_fuel(e)) {
                continue;
            }
            let mut out = self.part_power(e, false) as i64;
            if safe {
                let mut m2c = self.parts[e].info.engine_m2c as i64;
                if self.parts[e].has_fault(Fault::FuelFilter) {
                    m2c = m2c * physics::FUEL_FILTER_SAFE_PCT as i64 / 100;
                }
                out = out * m2c / 100;
            }
            pwr += out;
            cnt += 1;
        }
        for &a in &self.index.alternators {
            if self.is_alternator_on(a) {
                pwr += self.part_power(a, false) as i64;
            }
        }
        if cnt > 1 {
            pwr = pwr * 4 / (4 + cnt - 1);
        }
        pwr.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Turn the engines on. Combustion engines need battery charge for
    /// their ignition. Returns the new `engine_on`.
    pub fn start_engines(&mut self, msgs: &mut dyn Messages) -> bool {
        if self.index.engines.is_empty() {
            msgs.add_msg(MsgKind::Info, format!("The {} doesn't have an engine!", self.name));
            return false;
        }
        let has_charge = self.fuel_left(fuels::BATTERY) > 0;
        let mut started = false;
        for &e in &self.index.engines {
            if !self.is_engine_on(e) {
                continue;
            }
            let name = self.parts[e].name().to_string();
            if !self.engine_has_fuel(e) {
                msgs.add_msg(MsgKind::Bad, format!("Looks like the {name} is out of fuel."));
                continue;
            }
            if self.parts[e].info.epower < 0 && !self.is_electric(e) && !has_charge {
                msgs.add_msg(MsgKind::Bad, format!("The {name}'s starter clicks."));
                continue;
            }
            started = true;
        }
        self.engine_on = started;
        if started {
            msgs.add_msg(MsgKind::Good, format!("The {}'s engine starts up.", self.name));
        }
        log::debug!("{}: start engines -> {started}", self.name);
        started
    }

    pub fn stop_engines(&mut self, msgs: &mut dyn Messages) {
        if self.engine_on {
            msgs.add_msg(MsgKind::Info, format!("You turn the {}'s engine off.", self.name));
        }
        self.engine_on = false;
        self.alternator_load = 0;
    }

    fn is_electric(&self, e: usize) -> bool {
        self.parts[e].info.fuel_type == fuels::BATTERY
    }

    // ── Fuel ────────────────────────────────────────────────────────────

    /// Units of `fuel` on board. Perpetual fuels report a token amount;
    /// muscle power needs someone at the controls. Battery charge counts
    /// only batteries that can still discharge.
    pub fn fuel_left(&self, fuel: &str) -> i64 {
        if fuel == fuels::BATTERY {
            return self.battery_left();
        }
        let stored: i64 = self
            .live_parts()
            .map(|i| &self.parts[i])
            .filter(|p| p.ammo_current() == fuel)
            .map(|p| p.ammo_remaining())
            .sum();
        if fuel == fuels::MUSCLE {
            let pedalling = self.driver().is_some()
                && self.index.engines.iter().any(|&e| {
                    self.parts[e].info.fuel_type == fuels::MUSCLE && self.is_engine_on(e)
                });
            return stored + if pedalling { PERPETUAL_FUEL } else { 0 };
        }
        if self.registry().is_perpetual(fuel) {
            return stored + PERPETUAL_FUEL;
        }
        stored
    }

    pub fn fuel_capacity(&self, fuel: &str) -> i64 {
        if fuel == fuels::BATTERY {
            return self.battery_capacity();
        }
        self.live_parts()
            .map(|i| &self.parts[i])
            .filter(|p| p.ammo_current() == fuel)
            .map(|p| p.ammo_capacity())
            .sum()
    }

    /// Remove up to `amount` units of `fuel` from this vehicle. Returns the
    /// amount drained. Battery charge is taken evenly across batteries.
    pub fn drain(&mut self, fuel: &str, amount: i64) -> i64 {
        if fuel == fuels::BATTERY {
            return amount - self.discharge_battery(amount);
        }
        let mut left = amount;
        let mut drained = 0;
        for part in self.parts.iter_mut().filter(|p| !p.removed) {
            if left <= 0 {
                break;
            }
            if part.ammo_current() == fuel {
                let qty = part.ammo_consume(left);
                drained += qty;
                left -= qty;
            }
        }
        self.invalidate_mass();
        drained
    }

    /// Drain one tank or battery.
    pub fn drain_part(&mut self, p: usize, amount: i64) -> i64 {
        let Some(part) = self.get_part(p) else {
            log::warn!("{}: tried to drain invalid part index {p}", self.name);
            return 0;
        };
        if part.ammo_current() == fuels::BATTERY {
            return self.drain(fuels::BATTERY, amount);
        }
        if !part.info.is_tank() || part.ammo_remaining() == 0 {
            log::warn!("{}: tried to drain {} which holds nothing", self.name, part.name());
            return 0;
        }
        let drained = self.parts[p].ammo_consume(amount);
        self.invalidate_mass();
        drained
    }

    /// Watts each running engine asks of its fuel. Electric motors report
    /// battery units instead.
    pub fn fuel_usage(&self, rng: &mut impl Rng) -> BTreeMap<String, i64> {
        let mut usage = BTreeMap::new();
        for &e in &self.index.engines {
            if !self.is_engine_on(e) {
                continue;
            }
            let info = &self.parts[e].info;
            if info.fuel_type.is_empty() {
                continue;
            }
            if self.is_electric(e) {
                *usage.entry(info.fuel_type.clone()).or_insert(0) -=
                    epower_to_power(self.part_epower(e), rng) as i64;
            } else if !self.is_perpetual_engine(e) {
                let mut watts = self.part_power(e, false) as i64;
                if self.parts[e].has_fault(Fault::AirFilter) {
                    watts *= 2;
                }
                *usage.entry(info.fuel_type.clone()).or_insert(0) += watts;
            }
        }
        usage
    }

    /// Burn fuel for `turn_seconds` at `load` (0..=1 of full throttle).
    ///
    /// Strain above safe speed multiplies consumption by `1 + 100·strain²`.
    /// Fractions of a unit carry over in `fuel_remainder`. Returns units
    /// drained per fuel.
    pub fn consume_fuel(
        &mut self,
        load: f64,
        turn_seconds: f64,
        rng: &mut impl Rng,
    ) -> BTreeMap<String, i64> {
        let st = self.strain();
        let mut drained = BTreeMap::new();
        for (fuel, rate) in self.fuel_usage(rng) {
            let scaled = rate as f64 * load * (1.0 + st * st * 100.0);
            let units = if fuel == fuels::BATTERY {
                scaled
            } else {
                let energy = self
                    .registry()
                    .fuel(&fuel)
                    .map_or(0.0, |f| f.energy_per_unit);
                if energy <= 0.0 {
                    continue;
                }
                scaled * turn_seconds / energy
            };
            let wanted = units - self.fuel_remainder.get(&fuel).copied().unwrap_or(0.0);
            if wanted > 0.0 {
                let got = self.drain(&fuel, wanted.ceil() as i64);
                self.fuel_remainder.insert(fuel.clone(), got as f64 - wanted);
                drained.insert(fuel, got);
            } else {
                self.fuel_remainder.insert(fuel, -wanted);
            }
        }
        drained
    }

    // ── Batteries ───────────────────────────────────────────────────────

    fn usable_batteries(&self) -> impl Iterator<Item = usize> + '_ {
        self.index
            .batteries
            .iter()
            .copied()
            .filter(|&b| !self.parts[b].is_broken())
    }

    pub fn battery_left(&self) -> i64 {
        self.usable_batteries()
            .map(|b| self.parts[b].ammo_remaining())
            .sum()
    }

    pub fn battery_capacity(&self) -> i64 {
        self.usable_batteries()
            .map(|b| self.parts[b].ammo_capacity())
            .sum()
    }

    /// Charge this vehicle's batteries, emptiest first, in steps of one
    /// percent so several batteries fill evenly. Returns what did not fit.
    pub fn charge_battery(&mut self, amount: i64) -> i64 {
        let mut amount = amount;
        while amount > 0 {
            let Some(b) = self
                .usable_batteries()
                .filter(|&b| self.parts[b].ammo_remaining() < self.parts[b].ammo_capacity())
                .min_by_key(|&b| (self.parts[b].charge_percent(), b))
            else {
                break;
            };
            let part = &mut self.parts[b];
            let cap = part.ammo_capacity();
            let step = amount
                .min(cap - part.ammo_remaining())
                .min((cap / 100).max(1));
            let level = part.ammo_remaining() + step;
            part.ammo_set(fuels::BATTERY, level);
            amount -= step;
        }
        amount
    }

    /// Draw from this vehicle's batteries, fullest first, in one percent
    /// steps. Returns the part of the demand that could not be met.
    pub fn discharge_battery(&mut self, amount: i64) -> i64 {
        let mut amount = amount;
        while amount > 0 {
            let Some(b) = self
                .usable_batteries()
                .filter(|&b| self.parts[b].ammo_remaining() > 0)
                .max_by_key(|&b| (self.parts[b].charge_percent(), std::cmp::Reverse(b)))
            else {
                break;
            };
            let part = &mut self.parts[b];
            let step = amount
                .min(part.ammo_remaining())
                .min((part.ammo_capacity() / 100).max(1));
            amount -= part.ammo_consume(step);
        }
        amount
    }

    // ── Epower ──────────────────────────────────────────────────────────

    /// Sum enabled drains, alarm, camera, and (with the engine running)
    /// engine ignition and alternators. Updates `alternator_load`.
    pub fn epower_tally(&mut self, ambient: Ambient) -> EpowerTally {
        let mut epower: i32 = self
            .get_parts(flags::ENABLED_DRAINS_EPOWER, true)
            .iter()
            .map(|&p| self.parts[p].info.epower)
            .sum();
        if self.is_alarm_on {
            epower += physics::ALARM_EPOWER;
        }
        if self.camera_on {
            epower += self.index.camera_epower;
        }

        let mut engine_epower = 0;
        if self.engine_on {
            for &e in &self.index.engines {
                if self.is_engine_on(e) && !self.is_electric(e) {
                    engine_epower += self.part_epower(e);
                }
            }
            epower += engine_epower;

            let (mut alt_epower, mut alt_power) = (0, 0);
            for &a in &self.index.alternators {
                if self.is_alternator_on(a) {
                    alt_epower += self.parts[a].info.epower;
                    alt_power += self.part_power(a, false);
                }
            }
            if alt_epower > 0 {
                self.alternator_load = alt_power.abs();
                epower += alt_epower;
            }
        }

        let outside = |p: usize| !self.parts[p].is_broken() && !self.parts[p].inside;
        let solar: i32 = self
            .index
            .solar_panels
            .iter()
            .filter(|&&p| outside(p))
            .map(|&p| self.part_epower(p))
            .sum();
        let wind: i32 = self
            .index
            .wind_turbines
            .iter()
            .filter(|&&p| outside(p))
            .map(|&p| self.part_epower(p))
            .sum();
        epower += (solar as f64 * ambient.sunlight.clamp(0.0, 1.0)) as i32;
        epower += (wind as f64 * ambient.wind.clamp(0.0, 1.0)) as i32;

        EpowerTally {
            epower,
            engine_epower,
        }
    }

    /// Battery room left, in watts for one turn.
    pub fn epower_capacity_left(&self) -> i32 {
        let room = (self.fuel_capacity(fuels::BATTERY) - self.fuel_left(fuels::BATTERY)).max(0);
        power_to_epower(room.min(i32::MAX as i64 / physics::WATTS_PER_EPOWER_UNIT as i64) as i32)
    }

    /// Spin up reactors just enough to fill the batteries.
    ///
    /// Perpetual reactors run first and are free, but like fuelled ones
    /// they only cover the room left in the batteries. Fuelled reactors burn
    /// `output / efficiency` units, where efficiency is the part's `power`.
    /// If no reactor can run they shut down. Returns the new net epower.
    pub fn run_reactors(
        &mut self,
        epower: i32,
        rng: &mut impl Rng,
        msgs: &mut dyn Messages,
    ) -> i32 {
        let capacity_left = self.epower_capacity_left();
        if !self.has_part(flags::REACTOR, true) || capacity_left - epower <= 0 {
            return epower;
        }
        let mut epower = epower;
        let mut working = false;

        let mut reactors = self.index.reactors.clone();
        reactors.sort_by_key(|&r| !self.parts[r].has_flag(flags::PERPETUAL));
        for r in reactors {
            let part = &self.parts[r];
            if part.is_broken() || !part.enabled {
                continue;
            }
            if part.has_flag(flags::PERPETUAL) {
                working = true;
                let room = capacity_left - epower;
                if room > 0 {
                    epower += self.part_epower(r).min(room);
                }
                continue;
            }
            if part.ammo_remaining() <= 0 {
                continue;
            }
            let room = capacity_left - epower;
            if room <= 0 {
                // Batteries already covered by cheaper sources.
                working = true;
                continue;
            }
            let efficiency = part.info.power.max(1) as i64;
            let cap = i32::MAX as i64 / physics::WATTS_PER_EPOWER_UNIT as i64;
            let avail = (part.ammo_remaining() * efficiency).min(cap) as i32;
            let output = self.part_epower(r).min(power_to_epower(avail)).min(room);
            let battery_units = epower_to_power(output, rng) as i64;
            let mut fuel_used = battery_units / efficiency;
            if x_in_y(rng, battery_units % efficiency, efficiency) {
                fuel_used += 1;
            }
            self.parts[r].ammo_consume(fuel_used);
            working = true;
            epower += output;
        }

        if !working {
            for r in self.get_parts(flags::REACTOR, false) {
                self.parts[r].enabled = false;
            }
            msgs.add_msg(MsgKind::Bad, format!("The {}'s reactor dies!", self.name));
        }
        self.invalidate_mass();
        epower
    }

    /// The batteries could not cover demand: shed loads and maybe stall.
    pub fn battery_failure(&mut self, engine_epower: i32, msgs: &mut dyn Messages) {
        for flag in [flags::SCOOP, flags::RECHARGE] {
            for p in self.get_parts(flag, false) {
                self.parts[p].enabled = false;
            }
        }
        for p in self.get_parts(flags::ENABLED_DRAINS_EPOWER, true) {
            if self.parts[p].info.epower < 0 {
                self.parts[p].enabled = false;
            }
        }
        self.is_alarm_on = false;
        self.camera_on = false;
        msgs.add_msg(MsgKind::Bad, format!("The {}'s battery dies!", self.name));
        if engine_epower < 0 {
            self.engine_on = false;
            msgs.add_msg(MsgKind::Bad, format!("The {}'s engine dies!", self.name));
        }
        log::info!("{}: battery exhausted", self.name);
    }
}
