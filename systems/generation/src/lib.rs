#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic room generation and one-shot variation resolution.
//!
//! [`Generator`] maps a [`RoomRequest`] onto an immutable [`RoomConfig`]
//! without carrying any state between calls: every draw comes from a ChaCha
//! stream keyed by a SHA-256 digest of the session seed and the request.
//! [`VariationResolver`] draws the alternate-version tier for a room. Neither
//! caches anything; the world's ledger is responsible for freezing the first
//! result per index.

mod seed;
mod variation;

pub use variation::{VariationResolver, VariationTuning};

use liminal_core::{
    Direction, Doorway, InvalidInputError, RoomConfig, RoomDimensions, RoomIndex,
};
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;

use self::seed::{room_stream, STREAM_LAYOUT};

/// Inclusive range of floating point values sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SampleRange {
    /// Smallest value that may be drawn.
    pub min: f32,
    /// Largest value that may be drawn.
    pub max: f32,
}

impl SampleRange {
    /// Creates a new inclusive range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws a value uniformly from the range, tolerating reversed bounds.
    ///
    /// A non-finite bound collapses the range onto the other bound, or onto
    /// zero when neither is finite.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match (self.min.is_finite(), self.max.is_finite()) {
            (true, true) => {}
            (true, false) => return self.min,
            (false, true) => return self.max,
            (false, false) => return 0.0,
        }
        let (low, high) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if (high - low).abs() <= f32::EPSILON {
            return low;
        }
        rng.gen_range(low..=high)
    }
}

/// Tuning knobs controlling room layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationTuning {
    /// East-west floor extent in world units.
    pub room_width: SampleRange,
    /// North-south floor extent in world units.
    pub room_depth: SampleRange,
    /// Floor-to-ceiling height in world units.
    pub room_height: SampleRange,
    /// Doorway opening width.
    pub doorway_width: SampleRange,
    /// Doorway opening height before the headroom clamp.
    pub doorway_height: SampleRange,
    /// Minimum gap kept between a doorway's top and the ceiling.
    pub doorway_headroom: f32,
    /// Keeps doorways this far (normalised) from wall corners.
    pub doorway_margin: f32,
    /// Upper bound on doorways leading deeper; at least one is always placed.
    pub max_forward_doorways: u8,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            room_width: SampleRange::new(4.0, 12.0),
            room_depth: SampleRange::new(4.0, 12.0),
            room_height: SampleRange::new(2.6, 4.0),
            doorway_width: SampleRange::new(0.9, 1.4),
            doorway_height: SampleRange::new(2.0, 2.4),
            doorway_headroom: 0.2,
            doorway_margin: 0.15,
            max_forward_doorways: 3,
        }
    }
}

/// Identifies a room to generate together with how the traveller reached it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoomRequest {
    index: RoomIndex,
    entry: Option<Direction>,
    origin: Option<RoomIndex>,
}

impl RoomRequest {
    /// Requests a room with no knowledge of how it is approached.
    #[must_use]
    pub const fn new(index: RoomIndex) -> Self {
        Self {
            index,
            entry: None,
            origin: None,
        }
    }

    /// Records the direction of travel into the room.
    #[must_use]
    pub const fn with_entry(mut self, entry: Option<Direction>) -> Self {
        self.entry = entry;
        self
    }

    /// Records the room the traveller departs from.
    #[must_use]
    pub const fn with_origin(mut self, origin: Option<RoomIndex>) -> Self {
        self.origin = origin;
        self
    }

    /// Validates untyped caller input into a request.
    pub fn parse(
        index: i64,
        entry: Option<&str>,
        origin: Option<i64>,
    ) -> Result<Self, InvalidInputError> {
        let index = RoomIndex::try_from_signed(index)?;
        let entry = entry.map(str::parse::<Direction>).transpose()?;
        let origin = origin.map(RoomIndex::try_from_signed).transpose()?;
        Ok(Self::new(index).with_entry(entry).with_origin(origin))
    }

    /// Index of the requested room.
    #[must_use]
    pub const fn index(&self) -> RoomIndex {
        self.index
    }

    /// Direction of travel into the room, if known.
    #[must_use]
    pub const fn entry(&self) -> Option<Direction> {
        self.entry
    }

    /// Room the traveller departs from, if known.
    #[must_use]
    pub const fn origin(&self) -> Option<RoomIndex> {
        self.origin
    }
}

/// Stateless room generator bound to a session seed.
#[derive(Clone, Debug)]
pub struct Generator {
    seed: u64,
    tuning: GenerationTuning,
}

impl Generator {
    /// Creates a generator with the provided seed and tuning.
    #[must_use]
    pub fn new(seed: u64, tuning: GenerationTuning) -> Self {
        Self { seed, tuning }
    }

    /// Session seed the generator is keyed by.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Tuning the generator samples from.
    #[must_use]
    pub fn tuning(&self) -> &GenerationTuning {
        &self.tuning
    }

    /// Generates the unaltered descriptor for the requested room.
    ///
    /// Identical requests always produce identical descriptors.
    #[must_use]
    pub fn generate(&self, request: &RoomRequest) -> RoomConfig {
        let index = request.index;
        let mut rng = room_stream(
            self.seed,
            index,
            request.entry,
            request.origin,
            STREAM_LAYOUT,
        );
        let tuning = &self.tuning;

        let dimensions = RoomDimensions::new(
            tuning.room_width.sample(&mut rng),
            tuning.room_depth.sample(&mut rng),
            tuning.room_height.sample(&mut rng),
        );

        let mut doorways = Vec::new();
        let mut free_walls: Vec<Direction> = Direction::ALL.to_vec();

        if let Some(back) = request.origin.or_else(|| index.previous()) {
            let wall = request
                .entry
                .map_or(Direction::South, Direction::opposite);
            doorways.push(self.doorway(&mut rng, wall, dimensions, back));
            free_walls.retain(|candidate| *candidate != wall);
        }

        let max_forward = usize::from(tuning.max_forward_doorways.max(1)).min(free_walls.len());
        let forward_count = rng.gen_range(1..=max_forward);
        let mut forward_walls: Vec<Direction> = free_walls
            .choose_multiple(&mut rng, forward_count)
            .copied()
            .collect();
        forward_walls.sort();
        for wall in forward_walls {
            doorways.push(self.doorway(&mut rng, wall, dimensions, index.next()));
        }

        let pattern_seed = rng.gen();
        let geometry_seed = rng.gen();

        RoomConfig::new(
            index,
            dimensions,
            doorways,
            pattern_seed,
            geometry_seed,
            request.entry,
            request.origin,
        )
    }

    fn doorway<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        wall: Direction,
        dimensions: RoomDimensions,
        leads_to: RoomIndex,
    ) -> Doorway {
        let tuning = &self.tuning;
        let margin = tuning.doorway_margin.clamp(0.0, 0.5);
        let position = SampleRange::new(margin, 1.0 - margin).sample(rng);
        let width = tuning
            .doorway_width
            .sample(rng)
            .min(dimensions.wall_length(wall));
        let ceiling = (dimensions.height() - tuning.doorway_headroom).max(0.0);
        let height = tuning.doorway_height.sample(rng).min(ceiling);
        Doorway::new(wall, position, width, height, leads_to)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(0, GenerationTuning::default())
    }
}
