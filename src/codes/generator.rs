/// Numeric PIN generation
use rand::Rng;

/// Shortest PIN the lock keypads accept
pub const MIN_PIN_LENGTH: usize = 4;
/// Longest PIN the lock keypads accept
pub const MAX_PIN_LENGTH: usize = 8;

/// Generate a random numeric PIN of the given length.
///
/// The length is clamped into the 4-8 range the locks support. The first
/// digit is drawn from 1-9 so the rendered string never collapses a
/// leading zero; remaining digits are uniform over 0-9. No uniqueness
/// guarantee: callers needing per-device uniqueness must consult the store.
pub fn generate_pin(length: usize) -> String {
    let length = length.clamp(MIN_PIN_LENGTH, MAX_PIN_LENGTH);
    let mut rng = rand::thread_rng();

    let mut pin = String::with_capacity(length);
    pin.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..length {
        pin.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    pin
}
