#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Liminal engine.
//!
//! This crate defines the vocabulary that connects the room generator, the
//! authoritative room pool, the transition orchestrator, and the adapters
//! that host them. Rooms are addressed by [`RoomIndex`], described by
//! immutable [`RoomConfig`] values, and optionally altered once by a frozen
//! [`VariationState`]. Transitions between rooms are described by
//! [`TransitionEffect`] and sampled into [`TransitionParams`] every frame.

use std::{fmt, str::FromStr};

use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest variation tier the resolver can draw.
pub const MAX_VARIATION_TIER: u8 = 5;

/// Errors raised when callers hand malformed input to the core.
///
/// These are the only failures that cross the core's public boundary; cache,
/// eviction and transition conditions are all resolved internally by policy.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidInputError {
    /// A room index below zero was supplied.
    #[error("room index must be non-negative, got {0}")]
    NegativeIndex(i64),
    /// A room index beyond the addressable range was supplied.
    #[error("room index {0} exceeds the addressable range")]
    IndexOutOfRange(i64),
    /// An entry direction outside the four cardinal values was supplied.
    #[error("unknown entry direction `{0}`")]
    UnknownDirection(String),
}

/// Position of a room along the exploration axis.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoomIndex(u32);

impl RoomIndex {
    /// Index of the room every session starts in.
    pub const ORIGIN: Self = Self(0);

    /// Creates a room index from an unsigned value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Validates a signed index supplied by a caller.
    pub fn try_from_signed(value: i64) -> Result<Self, InvalidInputError> {
        if value < 0 {
            return Err(InvalidInputError::NegativeIndex(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| InvalidInputError::IndexOutOfRange(value))
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Distance of the room from the origin, used to scale escalation.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.0
    }

    /// Index of the room one step further along the axis.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Index of the room one step back, if the room is not the origin.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Absolute distance between two indices.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl TryFrom<i64> for RoomIndex {
    type Error = InvalidInputError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::try_from_signed(value)
    }
}

impl fmt::Display for RoomIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cardinal directions used both for walls and for the direction of travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward negative depth on the room's local axis.
    North,
    /// Toward positive width on the room's local axis.
    East,
    /// Toward positive depth on the room's local axis.
    South,
    /// Toward negative width on the room's local axis.
    West,
}

impl Direction {
    /// Every direction in deterministic wire order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Direction facing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Stable byte used when deriving seeds and on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = InvalidInputError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| InvalidInputError::UnknownDirection(value.to_string()))
    }
}

impl FromStr for Direction {
    type Err = InvalidInputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Self::North),
            "east" | "e" => Ok(Self::East),
            "south" | "s" => Ok(Self::South),
            "west" | "w" => Ok(Self::West),
            _ => Err(InvalidInputError::UnknownDirection(value.to_owned())),
        }
    }
}

/// Horizontal axis of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// East-west extent.
    Width,
    /// North-south extent.
    Depth,
}

/// Extent of a room measured in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    width: f32,
    depth: f32,
    height: f32,
}

impl RoomDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(width: f32, depth: f32, height: f32) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// East-west extent of the floor.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// North-south extent of the floor.
    #[must_use]
    pub const fn depth(&self) -> f32 {
        self.depth
    }

    /// Floor-to-ceiling height.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Length of the wall facing the provided direction.
    #[must_use]
    pub const fn wall_length(&self, wall: Direction) -> f32 {
        match wall {
            Direction::North | Direction::South => self.width,
            Direction::East | Direction::West => self.depth,
        }
    }
}

/// Opening carved into a wall that leads to another room.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Doorway {
    wall: Direction,
    position: f32,
    width: f32,
    height: f32,
    leads_to: RoomIndex,
}

impl Doorway {
    /// Creates a doorway, clamping its position along the wall into `[0, 1]`.
    #[must_use]
    pub fn new(wall: Direction, position: f32, width: f32, height: f32, leads_to: RoomIndex) -> Self {
        Self {
            wall,
            position: clamp_unit(position),
            width,
            height,
            leads_to,
        }
    }

    /// Wall that hosts the doorway.
    #[must_use]
    pub const fn wall(&self) -> Direction {
        self.wall
    }

    /// Normalised centre of the doorway along its wall.
    #[must_use]
    pub const fn position(&self) -> f32 {
        self.position
    }

    /// Opening width in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Opening height in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Room reached by walking through the doorway.
    #[must_use]
    pub const fn leads_to(&self) -> RoomIndex {
        self.leads_to
    }
}

/// Immutable descriptor of a generated room.
///
/// Produced exactly once per index and shared by reference afterwards. The
/// only way to obtain an altered copy is [`VariationState::apply`], which the
/// catalog runs once before the room is first recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    index: RoomIndex,
    dimensions: RoomDimensions,
    doorways: Vec<Doorway>,
    pattern_seed: u64,
    geometry_seed: u64,
    wrongness: u8,
    entry: Option<Direction>,
    origin: Option<RoomIndex>,
}

impl RoomConfig {
    /// Creates a new unaltered room descriptor.
    #[must_use]
    pub fn new(
        index: RoomIndex,
        dimensions: RoomDimensions,
        doorways: Vec<Doorway>,
        pattern_seed: u64,
        geometry_seed: u64,
        entry: Option<Direction>,
        origin: Option<RoomIndex>,
    ) -> Self {
        Self {
            index,
            dimensions,
            doorways,
            pattern_seed,
            geometry_seed,
            wrongness: 0,
            entry,
            origin,
        }
    }

    /// Index the room occupies along the exploration axis.
    #[must_use]
    pub const fn index(&self) -> RoomIndex {
        self.index
    }

    /// Extent of the room.
    #[must_use]
    pub const fn dimensions(&self) -> RoomDimensions {
        self.dimensions
    }

    /// Doorways in deterministic placement order.
    #[must_use]
    pub fn doorways(&self) -> &[Doorway] {
        &self.doorways
    }

    /// Seed used by the renderer for wallpaper and carpet patterns.
    #[must_use]
    pub const fn pattern_seed(&self) -> u64 {
        self.pattern_seed
    }

    /// Seed used by the renderer for geometric detailing.
    #[must_use]
    pub const fn geometry_seed(&self) -> u64 {
        self.geometry_seed
    }

    /// Variation tier stamped onto the room, zero when unaltered.
    #[must_use]
    pub const fn wrongness(&self) -> u8 {
        self.wrongness
    }

    /// Direction of travel that first led into the room, if known.
    #[must_use]
    pub const fn entry(&self) -> Option<Direction> {
        self.entry
    }

    /// Room the traveller came from when the room was first generated.
    #[must_use]
    pub const fn origin(&self) -> Option<RoomIndex> {
        self.origin
    }

    /// Doorways leading to the provided room.
    pub fn doorways_to(&self, destination: RoomIndex) -> impl Iterator<Item = &Doorway> {
        self.doorways
            .iter()
            .filter(move |doorway| doorway.leads_to == destination)
    }
}

/// Structural diff applied to a room when it is first generated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum VariationChange {
    /// Scales a horizontal axis of the room.
    Stretch {
        /// Axis being scaled.
        axis: Axis,
        /// Multiplier applied to the axis.
        factor: f32,
    },
    /// Scales the ceiling height down, pulling doorway tops with it.
    LowerCeiling {
        /// Multiplier applied to the room height.
        factor: f32,
    },
    /// Slides an existing doorway to a new position along its wall.
    ShiftDoorway {
        /// Ordinal of the doorway within the room's doorway list.
        slot: u8,
        /// New normalised position along the wall.
        position: f32,
    },
    /// Carves an additional doorway.
    ExtraDoorway {
        /// Doorway to append.
        doorway: Doorway,
    },
    /// Replaces the surface pattern seed.
    ReseedPattern {
        /// Replacement pattern seed.
        pattern_seed: u64,
    },
}

/// Alternate-version state resolved once for a room and frozen thereafter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationState {
    tier: u8,
    changes: Vec<VariationChange>,
}

impl VariationState {
    /// State describing an unaltered room.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            tier: 0,
            changes: Vec::new(),
        }
    }

    /// Creates a variation state, capping the tier at [`MAX_VARIATION_TIER`].
    #[must_use]
    pub fn new(tier: u8, changes: Vec<VariationChange>) -> Self {
        Self {
            tier: tier.min(MAX_VARIATION_TIER),
            changes,
        }
    }

    /// Escalation tier, zero when the room is unaltered.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.tier
    }

    /// Ordered structural diffs.
    #[must_use]
    pub fn changes(&self) -> &[VariationChange] {
        &self.changes
    }

    /// Reports whether the state alters the room at all.
    #[must_use]
    pub fn is_unaltered(&self) -> bool {
        self.tier == 0 && self.changes.is_empty()
    }

    /// Produces the altered copy of `base`, stamped with this state's tier.
    #[must_use]
    pub fn apply(&self, base: &RoomConfig) -> RoomConfig {
        let mut room = base.clone();
        for change in &self.changes {
            match *change {
                VariationChange::Stretch { axis, factor } => match axis {
                    Axis::Width => room.dimensions.width *= factor,
                    Axis::Depth => room.dimensions.depth *= factor,
                },
                VariationChange::LowerCeiling { factor } => {
                    room.dimensions.height *= factor;
                    let ceiling = room.dimensions.height;
                    for doorway in &mut room.doorways {
                        doorway.height = doorway.height.min(ceiling);
                    }
                }
                VariationChange::ShiftDoorway { slot, position } => {
                    if let Some(doorway) = room.doorways.get_mut(usize::from(slot)) {
                        doorway.position = clamp_unit(position);
                    }
                }
                VariationChange::ExtraDoorway { mut doorway } => {
                    doorway.height = doorway.height.min(room.dimensions.height);
                    room.doorways.push(doorway);
                }
                VariationChange::ReseedPattern { pattern_seed } => {
                    room.pattern_seed = pattern_seed;
                }
            }
        }
        room.wrongness = self.tier;
        room
    }
}

/// Dread intensity supplied by the escalation collaborator, clamped to `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Escalation(f32);

impl Escalation {
    /// No escalation at all.
    pub const CALM: Self = Self(0.0);

    /// Creates an escalation level, clamping into `[0, 1]` and mapping NaN to zero.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(clamp_unit(value))
    }

    /// Retrieves the clamped intensity.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }
}

/// Instantaneous audio analysis supplied by the audio collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSample {
    bands: [f32; 4],
    transient: f32,
}

impl AudioSample {
    /// Sample used when no audio collaborator is attached.
    #[must_use]
    pub const fn silent() -> Self {
        Self {
            bands: [0.0; 4],
            transient: 0.0,
        }
    }

    /// Creates a sample from band levels and a transient intensity.
    #[must_use]
    pub fn new(bands: [f32; 4], transient: f32) -> Self {
        Self {
            bands: bands.map(clamp_unit),
            transient: clamp_unit(transient),
        }
    }

    /// Band levels from lowest to highest frequency.
    #[must_use]
    pub const fn bands(&self) -> [f32; 4] {
        self.bands
    }

    /// Sharpness of the most recent transient in `[0, 1]`.
    #[must_use]
    pub const fn transient(&self) -> f32 {
        self.transient
    }
}

/// Visual effect masking the handoff between two rooms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransitionEffect {
    /// Plain fade to black.
    Fade,
    /// Field-of-view bulge.
    Warp,
    /// Push in while the view narrows.
    Zoom,
    /// Fade with a shimmering warp.
    Dissolve,
    /// Violent oscillation reserved for deep rooms.
    Impossible,
}

impl TransitionEffect {
    /// Every effect in deterministic order.
    pub const ALL: [Self; 5] = [
        Self::Fade,
        Self::Warp,
        Self::Zoom,
        Self::Dissolve,
        Self::Impossible,
    ];
}

/// Lifecycle phase of the transition state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// No transition is running.
    #[default]
    Idle,
    /// Progress is below the starting threshold.
    Starting,
    /// Progress lies between the starting and ending thresholds.
    InProgress,
    /// Progress is at or past the ending threshold.
    Ending,
    /// The last transition was discarded by an explicit cancel.
    Cancelled,
}

/// What caused a transition to begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionTrigger {
    /// The traveller walked through a doorway on the given wall.
    Doorway {
        /// Wall of the departing room, which is also the direction of travel.
        wall: Direction,
    },
    /// The traveller retraced their steps without a specific doorway.
    Backtrack,
    /// The host moved the traveller directly.
    Forced,
}

impl TransitionTrigger {
    /// Direction of travel implied by the trigger, if any.
    #[must_use]
    pub const fn travel_direction(&self) -> Option<Direction> {
        match self {
            Self::Doorway { wall } => Some(*wall),
            Self::Backtrack | Self::Forced => None,
        }
    }
}

/// Camera and compositing parameters sampled from a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionParams {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Scene opacity where 1.0 is fully visible.
    pub opacity: f32,
    /// Strength of the screen-space warp distortion.
    pub warp_strength: f32,
    /// Camera zoom multiplier where 1.0 is neutral.
    pub zoom: f32,
}

impl TransitionParams {
    /// Field of view used outside of transitions.
    pub const BASE_FOV: f32 = 75.0;

    /// Parameters describing an undisturbed view.
    pub const NEUTRAL: Self = Self {
        fov: Self::BASE_FOV,
        opacity: 1.0,
        warp_strength: 0.0,
        zoom: 1.0,
    };
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Picks an item from a weight table using the supplied random source.
///
/// Negative, NaN and infinite weights count as zero. Returns `None` when the
/// table is empty or carries no positive weight.
pub fn choose_weighted<T, R>(table: &[(T, f32)], rng: &mut R) -> Option<T>
where
    T: Copy,
    R: Rng + ?Sized,
{
    let weights = table.iter().map(|(_, weight)| sanitize_weight(*weight));
    let distribution = WeightedIndex::new(weights).ok()?;
    table.get(distribution.sample(rng)).map(|(item, _)| *item)
}

fn sanitize_weight(weight: f32) -> f32 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_room() -> RoomConfig {
        RoomConfig::new(
            RoomIndex::new(3),
            RoomDimensions::new(6.0, 8.0, 3.0),
            vec![
                Doorway::new(Direction::South, 0.5, 1.0, 2.2, RoomIndex::new(2)),
                Doorway::new(Direction::North, 0.3, 1.2, 2.4, RoomIndex::new(4)),
            ],
            11,
            29,
            Some(Direction::North),
            Some(RoomIndex::new(2)),
        )
    }

    #[test]
    fn negative_index_is_rejected() {
        assert_eq!(
            RoomIndex::try_from_signed(-1),
            Err(InvalidInputError::NegativeIndex(-1))
        );
        assert_eq!(RoomIndex::try_from(7_i64), Ok(RoomIndex::new(7)));
    }

    #[test]
    fn oversized_index_is_rejected() {
        let value = i64::from(u32::MAX) + 1;
        assert_eq!(
            RoomIndex::try_from_signed(value),
            Err(InvalidInputError::IndexOutOfRange(value))
        );
    }

    #[test]
    fn origin_has_no_previous_room() {
        assert_eq!(RoomIndex::ORIGIN.previous(), None);
        assert_eq!(RoomIndex::new(4).previous(), Some(RoomIndex::new(3)));
    }

    #[test]
    fn direction_parsing_accepts_only_cardinals() {
        assert_eq!("North".parse::<Direction>(), Ok(Direction::North));
        assert_eq!(" w ".parse::<Direction>(), Ok(Direction::West));
        assert!(matches!(
            "up".parse::<Direction>(),
            Err(InvalidInputError::UnknownDirection(_))
        ));
        assert_eq!(Direction::try_from(2), Ok(Direction::South));
        assert!(Direction::try_from(4).is_err());
    }

    #[test]
    fn direction_codes_round_trip() {
        for direction in Direction::ALL {
            assert_eq!(Direction::try_from(direction.code()), Ok(direction));
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn unaltered_variation_only_stamps_tier_zero() {
        let room = sample_room();
        assert_eq!(VariationState::none().apply(&room), room);
    }

    #[test]
    fn variation_applies_changes_in_order() {
        let room = sample_room();
        let extra = Doorway::new(Direction::East, 0.5, 1.0, 2.0, RoomIndex::new(4));
        let variation = VariationState::new(
            4,
            vec![
                VariationChange::Stretch {
                    axis: Axis::Width,
                    factor: 2.0,
                },
                VariationChange::LowerCeiling { factor: 0.5 },
                VariationChange::ShiftDoorway {
                    slot: 1,
                    position: 1.7,
                },
                VariationChange::ExtraDoorway { doorway: extra },
            ],
        );

        let altered = variation.apply(&room);

        assert_eq!(altered.wrongness(), 4);
        assert!((altered.dimensions().width() - 12.0).abs() < f32::EPSILON);
        assert!((altered.dimensions().height() - 1.5).abs() < f32::EPSILON);
        assert!(altered.doorways().iter().all(|door| door.height() <= 1.5));
        assert!((altered.doorways()[1].position() - 1.0).abs() < f32::EPSILON);
        assert_eq!(altered.doorways().len(), 3);
        assert_eq!(room.wrongness(), 0, "base descriptor must stay untouched");
    }

    #[test]
    fn extra_doorway_fits_under_a_lowered_ceiling() {
        let room = sample_room();
        let tall = Doorway::new(Direction::West, 0.5, 1.0, 2.25, RoomIndex::new(2));
        let variation = VariationState::new(
            2,
            vec![
                VariationChange::LowerCeiling { factor: 0.55 },
                VariationChange::ExtraDoorway { doorway: tall },
            ],
        );

        let altered = variation.apply(&room);
        let ceiling = altered.dimensions().height();
        let extra = altered.doorways().last().expect("extra doorway");

        assert_eq!(extra.wall(), Direction::West);
        assert!((extra.height() - ceiling).abs() < f32::EPSILON);
    }

    #[test]
    fn shifting_missing_doorway_is_ignored() {
        let room = sample_room();
        let variation = VariationState::new(
            1,
            vec![VariationChange::ShiftDoorway {
                slot: 9,
                position: 0.1,
            }],
        );
        assert_eq!(variation.apply(&room).doorways(), room.doorways());
    }

    #[test]
    fn variation_tier_is_capped() {
        assert_eq!(VariationState::new(9, Vec::new()).tier(), MAX_VARIATION_TIER);
    }

    #[test]
    fn escalation_clamps_input() {
        assert_eq!(Escalation::new(1.5).get(), 1.0);
        assert_eq!(Escalation::new(-0.2).get(), 0.0);
        assert_eq!(Escalation::new(f32::NAN).get(), 0.0);
    }

    #[test]
    fn weighted_choice_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let table = [("never", 0.0), ("always", 2.0), ("broken", f32::NAN)];
        for _ in 0..64 {
            assert_eq!(choose_weighted(&table, &mut rng), Some("always"));
        }
    }

    #[test]
    fn weighted_choice_handles_empty_tables() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let empty: [(u8, f32); 0] = [];
        assert_eq!(choose_weighted(&empty, &mut rng), None);
        assert_eq!(choose_weighted(&[(1_u8, 0.0)], &mut rng), None);
    }

    #[test]
    fn weighted_choice_is_reproducible_under_seed() {
        let table = [(0_u8, 1.0), (1, 1.0), (2, 1.0)];
        let draw = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..32)
                .filter_map(|_| choose_weighted(&table, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(17), draw(17));
    }

    #[test]
    fn room_config_round_trips_through_bincode() {
        let room = sample_room();
        let bytes = bincode::serialize(&room).expect("serialize");
        let restored: RoomConfig = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, room);
    }
}
