//! Passengers riding on boardable parts.
//!
//! The vehicle stores a [`Passenger`] snapshot on the part, enough for mass
//! and muscle-engine calculations. The live creature stays with the caller
//! and is reached through the [`Occupant`] capability trait.

use serde::{Deserialize, Serialize};

use crate::constants::flags;
use crate::point::Tripoint;
use crate::vehicle::Vehicle;

/// What the vehicle remembers about whoever sits on a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: u64,
    pub name: String,
    pub is_player: bool,
    pub weight_kg: f64,
    /// Current strength stat. 8 is average.
    pub strength: i32,
}

/// A creature that can ride a vehicle.
pub trait Occupant {
    fn id(&self) -> u64;
    fn name(&self) -> &str;
    fn is_player(&self) -> bool;
    fn weight(&self) -> f64;
    fn strength(&self) -> i32;
    fn position(&self) -> Tripoint;
    fn set_position(&mut self, pos: Tripoint);
    /// Event addressed to this occupant ("You board the car.").
    fn notify(&mut self, text: &str);

    fn snapshot(&self) -> Passenger {
        Passenger {
            id: self.id(),
            name: self.name().to_string(),
            is_player: self.is_player(),
            weight_kg: self.weight(),
            strength: self.strength(),
        }
    }
}

impl Vehicle {
    /// Seat `who` on BOARDABLE part `p`. Fails if the part is broken, not
    /// boardable, or already occupied.
    pub fn board(&mut self, p: usize, who: &mut dyn Occupant) -> bool {
        let Some(seat) = self.get_part(p) else {
            return false;
        };
        if !seat.has_flag(flags::BOARDABLE) || seat.is_broken() || seat.passenger.is_some() {
            return false;
        }
        let pos = self.global_part_pos(p);
        let seat_name = seat.name().to_string();
        who.set_position(pos);
        who.notify(&format!("You board the {}'s {}.", self.name, seat_name));
        self.parts[p].passenger = Some(who.snapshot());
        self.invalidate_mass();
        true
    }

    /// Take whoever sits on `p` off the vehicle.
    pub fn unboard(&mut self, p: usize) -> Option<Passenger> {
        let passenger = self.parts.get_mut(p)?.passenger.take()?;
        self.invalidate_mass();
        Some(passenger)
    }

    /// Parts with someone on them.
    pub fn boarded_parts(&self) -> Vec<usize> {
        self.live_parts()
            .filter(|&i| self.parts[i].passenger.is_some())
            .collect()
    }

    pub fn passenger(&self, p: usize) -> Option<&Passenger> {
        self.get_part(p)?.passenger.as_ref()
    }

    /// Whoever sits at a working control station.
    pub fn driver(&self) -> Option<&Passenger> {
        self.index.relative_parts.values().find_map(|here| {
            let has_controls = here.iter().any(|&i| {
                let p = &self.parts[i];
                p.has_flag(flags::CONTROLS) && !p.is_broken()
            });
            if !has_controls {
                return None;
            }
            here.iter().find_map(|&i| self.parts[i].passenger.as_ref())
        })
    }

    /// Part carrying the passenger with `id`.
    pub fn find_passenger(&self, id: u64) -> Option<usize> {
        self.live_parts()
            .find(|&i| self.parts[i].passenger.as_ref().is_some_and(|p| p.id == id))
    }
}
