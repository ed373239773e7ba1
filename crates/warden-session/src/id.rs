//! Session id generation.

use rand::Rng;

/// Characters a session id is drawn from: ASCII letters, digits, and every
/// printable ASCII punctuation symbol except `"` and `\`.
pub const ALPHABET: &[u8; 92] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!#$%&'()*+,-./:;<=>?@[]^_`{|}~";

/// Generate an id of `length` characters using the thread-local RNG.
pub fn generate_id(length: usize) -> String {
    generate_id_with(&mut rand::rng(), length)
}

/// Generate an id of `length` characters from the given RNG.
///
/// Every character is an independent uniform draw from [`ALPHABET`].
pub fn generate_id_with<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Number of distinct ids of the given length, or `None` if it exceeds `u128`.
pub fn id_space(length: usize) -> Option<u128> {
    u32::try_from(length)
        .ok()
        .and_then(|exp| (ALPHABET.len() as u128).checked_pow(exp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_is_distinct() {
        let unique: HashSet<u8> = ALPHABET.iter().copied().collect();
        assert_eq!(unique.len(), 92);
        assert!(!ALPHABET.contains(&b'"'));
        assert!(!ALPHABET.contains(&b'\\'));
        assert!(ALPHABET.iter().all(|b| b.is_ascii_graphic()));
    }

    #[test]
    fn test_generated_length_and_charset() {
        for length in [1, 16, 64, 200] {
            let id = generate_id(length);
            assert_eq!(id.chars().count(), length);
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_zero_length_is_empty() {
        assert_eq!(generate_id(0), "");
    }

    #[test]
    fn test_draws_cover_alphabet() {
        // 92 symbols over 20k draws: every symbol shows up with overwhelming probability
        let id = generate_id(20_000);
        let seen: HashSet<u8> = id.bytes().collect();
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn test_id_space() {
        assert_eq!(id_space(0), Some(1));
        assert_eq!(id_space(1), Some(92));
        assert_eq!(id_space(2), Some(92 * 92));
        assert_eq!(id_space(64), None);
    }
}
