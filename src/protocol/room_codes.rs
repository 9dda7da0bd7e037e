use rand::RngExt;

use super::types::ROOM_CODE_LENGTH;

/// Generate a room code avoiding confusing characters (0, O, I, 1).
/// Uses uppercase letters and numbers for easy verbal communication.
pub fn generate_room_code() -> String {
    generate_room_code_of_length(ROOM_CODE_LENGTH)
}

/// Generate a clean room code of the requested length.
pub fn generate_room_code_of_length(length: usize) -> String {
    const CLEAN_CHARS: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CLEAN_CHARS.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = CLEAN_CHARS[idx] as char;
            ch
        })
        .collect()
}
