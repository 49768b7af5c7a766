//! Zone and valve identities.
//!
//! Single source of truth for which zones exist, what they are called in
//! the configuration file, and which radiator valve belongs to which zone.
//! Array positions are assigned by the explicit `index()` tables below, so
//! reordering the enum declarations never changes meaning.

// ---------------------------------------------------------------------------
// Floor-heating zones
// ---------------------------------------------------------------------------

/// Zones sensed through the floor-heating loop.  Their errors feed the
/// weighted-mean vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloorZone {
    LivingRoom,
    Corridor,
    Bathroom,
    Entrance,
    UpperCorridor,
    Wardrobe,
    UpperBathroom,
}

impl FloorZone {
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] = [
        Self::LivingRoom,
        Self::Corridor,
        Self::Bathroom,
        Self::Entrance,
        Self::UpperCorridor,
        Self::Wardrobe,
        Self::UpperBathroom,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::LivingRoom => 0,
            Self::Corridor => 1,
            Self::Bathroom => 2,
            Self::Entrance => 3,
            Self::UpperCorridor => 4,
            Self::Wardrobe => 5,
            Self::UpperBathroom => 6,
        }
    }

    /// Key used in factor maps and point maps.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LivingRoom => "livingroom",
            Self::Corridor => "corridor",
            Self::Bathroom => "bathroom",
            Self::Entrance => "entrance",
            Self::UpperCorridor => "upper_corridor",
            Self::Wardrobe => "wardrobe",
            Self::UpperBathroom => "upper_bathroom",
        }
    }
}

// ---------------------------------------------------------------------------
// Radiator zones
// ---------------------------------------------------------------------------

/// Zones heated by radiators with thermostatic valves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadiatorZone {
    Office,
    KidsRoom,
    Bedroom,
    Garage,
}

impl RadiatorZone {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [Self::Office, Self::KidsRoom, Self::Bedroom, Self::Garage];

    pub const fn index(self) -> usize {
        match self {
            Self::Office => 0,
            Self::KidsRoom => 1,
            Self::Bedroom => 2,
            Self::Garage => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::KidsRoom => "kidsroom",
            Self::Bedroom => "bedroom",
            Self::Garage => "garage",
        }
    }

    /// Valves installed in this zone.
    pub const fn valves(self) -> &'static [Valve] {
        match self {
            Self::Office => &[Valve::Office],
            Self::KidsRoom => &[Valve::KidsRoom],
            Self::Bedroom => &[Valve::BedroomLeft, Valve::BedroomRight],
            Self::Garage => &[Valve::Garage],
        }
    }
}

// ---------------------------------------------------------------------------
// Radiator valves
// ---------------------------------------------------------------------------

/// Physical thermostatic radiator valves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Valve {
    Office,
    KidsRoom,
    BedroomLeft,
    BedroomRight,
    Garage,
}

impl Valve {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Office,
        Self::KidsRoom,
        Self::BedroomLeft,
        Self::BedroomRight,
        Self::Garage,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Office => 0,
            Self::KidsRoom => 1,
            Self::BedroomLeft => 2,
            Self::BedroomRight => 3,
            Self::Garage => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::KidsRoom => "kidsroom",
            Self::BedroomLeft => "bedroom_left",
            Self::BedroomRight => "bedroom_right",
            Self::Garage => "garage",
        }
    }

    /// The radiator zone whose error drives this valve.
    pub const fn zone(self) -> RadiatorZone {
        match self {
            Self::Office => RadiatorZone::Office,
            Self::KidsRoom => RadiatorZone::KidsRoom,
            Self::BedroomLeft | Self::BedroomRight => RadiatorZone::Bedroom,
            Self::Garage => RadiatorZone::Garage,
        }
    }
}

/// Per-zone floor-heating errors, indexed by [`FloorZone::index`].
pub type FloorValues = [f64; FloorZone::COUNT];
/// Per-zone radiator errors or weights, indexed by [`RadiatorZone::index`].
pub type RadiatorValues = [f64; RadiatorZone::COUNT];
/// Per-valve positions, indexed by [`Valve::index`].
pub type ValveValues = [f64; Valve::COUNT];
