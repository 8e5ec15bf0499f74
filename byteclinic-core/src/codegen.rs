// byteclinic-core/src/codegen.rs

use rand::Rng;

/// 36-symbol alphabet the codes are drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Every code is exactly this long.
pub const CODE_LEN: usize = 8;

/// Source of candidate codes. A trait so the issuance service can be
/// driven by a scripted sequence in tests (forced collisions, exhaustion).
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default generator: 8 chars, each uniform over `A-Z0-9`. Codes name a
/// public redemption token, not a secret, so a non-cryptographic RNG is
/// acceptable; collisions are handled by the issuance retry loop.
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        generate_code(&mut rand::rng())
    }
}

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Uppercase + trim, applied to every caller-submitted code before lookup.
pub fn normalize_code(submitted: &str) -> String {
    submitted.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid_code(code: &str) -> bool {
        code.len() == CODE_LEN
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }

    #[test]
    fn generated_codes_match_charset_and_length() {
        let generator = RandomCodeGenerator;
        for _ in 0..500 {
            let code = generator.generate();
            assert!(is_valid_code(&code), "bad code: {code}");
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_code("  ab12cd34 \n"), "AB12CD34");
        assert_eq!(normalize_code("ZZZZ9999"), "ZZZZ9999");
    }

    #[test]
    fn consecutive_codes_are_rarely_equal() {
        // Not a strict guarantee, but 50 draws from 36^8 repeating would
        // point at a broken RNG wiring.
        let generator = RandomCodeGenerator;
        let first = generator.generate();
        assert!((0..50).any(|_| generator.generate() != first));
    }
}
