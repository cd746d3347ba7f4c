use liminal_core::{Direction, RoomIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

pub(crate) const STREAM_LAYOUT: &str = "room.layout";
pub(crate) const STREAM_VARIATION: &str = "room.variation";

const NO_DIRECTION: u8 = 0xff;

/// Opens an independent random stream for a room.
///
/// The stream is keyed by every input that identifies a generation request,
/// so two requests share a stream only when they are indistinguishable.
pub(crate) fn room_stream(
    global_seed: u64,
    index: RoomIndex,
    entry: Option<Direction>,
    origin: Option<RoomIndex>,
    label: &str,
) -> ChaCha8Rng {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(index.get().to_le_bytes());
    hasher.update([entry.map_or(NO_DIRECTION, Direction::code)]);
    match origin {
        Some(origin) => {
            hasher.update([1_u8]);
            hasher.update(origin.get().to_le_bytes());
        }
        None => hasher.update([0_u8]),
    }
    hasher.update(label.as_bytes());
    finalize_stream(hasher)
}

/// Opens a stream keyed only by the session seed and the room index.
pub(crate) fn index_stream(global_seed: u64, index: RoomIndex, label: &str) -> ChaCha8Rng {
    room_stream(global_seed, index, None, None, label)
}

fn finalize_stream(hasher: Sha256) -> ChaCha8Rng {
    let digest = hasher.finalize();
    let mut seed = [0_u8; 32];
    seed.copy_from_slice(&digest);
    ChaCha8Rng::from_seed(seed)
}
