//! Vehicle constants: part flags, location slots, fuel ids, physical tunables.
//!
//! Flags and locations are plain `&str` ids matching the strings used in
//! `data/vehicle_parts.json`. Both the runtime crate and the simtest harness
//! use these.

pub mod flags {
    // Structure & layout
    pub const PROTRUSION: &str = "PROTRUSION";
    pub const NOINSTALL: &str = "NOINSTALL";
    pub const OBSTACLE: &str = "OBSTACLE";
    pub const OPAQUE: &str = "OPAQUE";
    pub const OPENABLE: &str = "OPENABLE";
    pub const ROOF: &str = "ROOF";
    pub const AISLE: &str = "AISLE";
    pub const HALF_BOARD: &str = "HALF_BOARD";
    pub const FULL_BOARD: &str = "FULL_BOARD";
    pub const WINDOW: &str = "WINDOW";
    pub const WINDSHIELD: &str = "WINDSHIELD";
    pub const CURTAIN: &str = "CURTAIN";
    pub const ARMOR: &str = "ARMOR";
    pub const CARGO: &str = "CARGO";
    pub const LOCKABLE_CARGO: &str = "LOCKABLE_CARGO";
    pub const CARGO_LOCKING: &str = "CARGO_LOCKING";
    pub const INTERNAL: &str = "INTERNAL";
    // Seating & control
    pub const SEAT: &str = "SEAT";
    pub const BOARDABLE: &str = "BOARDABLE";
    pub const BELTABLE: &str = "BELTABLE";
    pub const SEATBELT: &str = "SEATBELT";
    pub const CONTROLS: &str = "CONTROLS";
    pub const ON_CONTROLS: &str = "ON_CONTROLS";
    pub const SECURITY: &str = "SECURITY";
    pub const DOOR_MOTOR: &str = "DOOR_MOTOR";
    pub const VISION: &str = "VISION";
    pub const CAMERA: &str = "CAMERA";
    pub const ANIMAL_CTRL: &str = "ANIMAL_CTRL";
    pub const HORN: &str = "HORN";
    // Locomotion
    pub const WHEEL: &str = "WHEEL";
    pub const STEERABLE: &str = "STEERABLE";
    pub const TRACKED: &str = "TRACKED";
    pub const STABLE: &str = "STABLE";
    pub const FLOATS: &str = "FLOATS";
    pub const EXTRA_DRAG: &str = "EXTRA_DRAG";
    // Power
    pub const ENGINE: &str = "ENGINE";
    pub const E_ALTERNATOR: &str = "E_ALTERNATOR";
    pub const ALTERNATOR: &str = "ALTERNATOR";
    pub const BATTERY: &str = "BATTERY";
    pub const BATTERY_MOUNT: &str = "BATTERY_MOUNT";
    pub const NEEDS_BATTERY_MOUNT: &str = "NEEDS_BATTERY_MOUNT";
    pub const FUEL_TANK: &str = "FUEL_TANK";
    pub const REACTOR: &str = "REACTOR";
    pub const PERPETUAL: &str = "PERPETUAL";
    pub const SOLAR_PANEL: &str = "SOLAR_PANEL";
    pub const WIND_TURBINE: &str = "WIND_TURBINE";
    pub const FUNNEL: &str = "FUNNEL";
    pub const POWER_TRANSFER: &str = "POWER_TRANSFER";
    pub const ENABLED_DRAINS_EPOWER: &str = "ENABLED_DRAINS_EPOWER";
    pub const UNMOUNT_ON_MOVE: &str = "UNMOUNT_ON_MOVE";
    pub const UNMOUNT_ON_DAMAGE: &str = "UNMOUNT_ON_DAMAGE";
    // Weapons & racks
    pub const TURRET: &str = "TURRET";
    pub const TURRET_MOUNT: &str = "TURRET_MOUNT";
    pub const BIKE_RACK_VEH: &str = "BIKE_RACK_VEH";
    // Toggle groups: a newly installed part starts enabled only if another
    // part of the same group already is.
    pub const CONE_LIGHT: &str = "CONE_LIGHT";
    pub const CIRCLE_LIGHT: &str = "CIRCLE_LIGHT";
    pub const AISLE_LIGHT: &str = "AISLE_LIGHT";
    pub const DOME_LIGHT: &str = "DOME_LIGHT";
    pub const ATOMIC_LIGHT: &str = "ATOMIC_LIGHT";
    pub const STEREO: &str = "STEREO";
    pub const CHIMES: &str = "CHIMES";
    pub const FRIDGE: &str = "FRIDGE";
    pub const FREEZER: &str = "FREEZER";
    pub const RECHARGE: &str = "RECHARGE";
    pub const PLOW: &str = "PLOW";
    pub const REAPER: &str = "REAPER";
    pub const PLANTER: &str = "PLANTER";
    pub const SCOOP: &str = "SCOOP";
    pub const WATER_PURIFIER: &str = "WATER_PURIFIER";
    pub const ROCKWHEEL: &str = "ROCKWHEEL";

    pub const TOGGLE_GROUPS: [&str; 16] = [
        CONE_LIGHT,
        CIRCLE_LIGHT,
        AISLE_LIGHT,
        DOME_LIGHT,
        ATOMIC_LIGHT,
        STEREO,
        CHIMES,
        FRIDGE,
        FREEZER,
        RECHARGE,
        PLOW,
        REAPER,
        PLANTER,
        SCOOP,
        WATER_PURIFIER,
        ROCKWHEEL,
    ];

    /// Flags that emit light when enabled.
    pub const LIGHTS: [&str; 5] = [CONE_LIGHT, CIRCLE_LIGHT, AISLE_LIGHT, DOME_LIGHT, ATOMIC_LIGHT];

    /// (flag of the new part, flag it needs on the same mount).
    pub const MOUNT_ANCHORS: [(&str, &str); 9] = [
        (ALTERNATOR, E_ALTERNATOR),
        (SEATBELT, BELTABLE),
        (INTERNAL, CARGO),
        (CURTAIN, WINDOW),
        (ON_CONTROLS, CONTROLS),
        (CARGO_LOCKING, LOCKABLE_CARGO),
        (NEEDS_BATTERY_MOUNT, BATTERY_MOUNT),
        (DOOR_MOTOR, OPENABLE),
        (TURRET, TURRET_MOUNT),
    ];
}

pub mod locations {
    pub const STRUCTURE: &str = "structure";
    pub const UNDER: &str = "under";
    pub const CENTER: &str = "center";
    pub const ROOF: &str = "roof";
    pub const ON_ROOF: &str = "on_roof";
    pub const ENGINE_BLOCK: &str = "engine_block";
    pub const FUEL_SOURCE: &str = "fuel_source";
    pub const ARMOR: &str = "armor";
    pub const CONTROLS: &str = "controls";
    pub const REACTOR: &str = "reactor";
}

pub mod fuels {
    pub const GASOLINE: &str = "gasoline";
    pub const DIESEL: &str = "diesel";
    pub const BATTERY: &str = "battery";
    pub const MUSCLE: &str = "muscle";
    pub const PLASMA: &str = "plasma";
    pub const PLUTONIUM: &str = "plutonium";
}

pub mod physics {
    /// Watts per battery charge unit per turn.
    pub const WATTS_PER_EPOWER_UNIT: i32 = 373;
    /// Air density at sea level, kg/m³.
    pub const AIR_DENSITY: f64 = 1.29;
    /// Water density, kg/m³.
    pub const WATER_DENSITY: f64 = 1000.0;
    /// Side of one vehicle tile, metres.
    pub const TILE_SIZE_M: f64 = 1.0;
    /// Gravity, m/s².
    pub const GRAVITY: f64 = 9.8;
    /// Conversion from m/s to internal velocity units (1/100 mph).
    pub const MS_TO_VMIPH: f64 = 223.694;

    // Air drag raycast
    pub const AIR_BASE: f64 = 0.25;
    pub const AIR_MOD: f64 = 0.1;
    pub const BASE_HEIGHT: f64 = 1.4;
    pub const ROOF_HEIGHT: f64 = 0.1;
    pub const AISLE_HEIGHT: f64 = 0.6;
    pub const FULLBOARD_HEIGHT: f64 = 0.5;
    pub const WINDMILL_HEIGHT: f64 = 0.7;

    // Rolling resistance
    /// Wheel factor for a vehicle with no wheels (it drags along the ground).
    pub const NO_WHEEL_FACTOR: f64 = 50.0;
    /// Reference per-wheel coefficient used to normalize wheel counts.
    pub const STANDARD_WHEEL_C: f64 = 1.25;
    /// Ratio of the constant rolling term to the velocity term.
    pub const ROLLING_CONSTANT_RATIO: f64 = 33.33;
    /// Newtons of rolling force per kg at a wheel factor of 1 (g / 1000).
    pub const ROLLING_SCALE: f64 = GRAVITY / 1000.0;

    // Water
    pub const WATER_BASE: f64 = 1.25;
    pub const HULL_BASE_HEIGHT: f64 = 0.3;
    pub const HULL_COVERAGE_HEIGHT: f64 = 0.5;

    // Traction
    pub const MIN_TRACTION: f64 = 0.1;
    pub const MIN_TRACTION_AREA: f64 = 0.01;

    /// Cap on islands produced by one split pass.
    pub const MAX_SPLIT_ISLANDS: usize = 4;
    /// Percent multiplier applied to safe velocity by a clogged fuel filter.
    pub const FUEL_FILTER_SAFE_PCT: i32 = 60;
    /// Epower drawn by an armed alarm.
    pub const ALARM_EPOWER: i32 = -10;
}
