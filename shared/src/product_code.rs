//! Product code generation
//!
//! Codes are a two-letter category prefix followed by six decimal digits,
//! e.g. `EC042917`. Generation retries random digits until a candidate is
//! free; the storage uniqueness constraint stays the final authority.

use rand::Rng;

use crate::error::{DomainError, DomainResult};
use crate::models::ProductCategory;

/// Default bound on generation attempts
pub const MAX_CODE_ATTEMPTS: u32 = 100;

const CODE_DIGITS: usize = 6;
const CODE_SPACE: u32 = 1_000_000;

/// A random candidate code for `category`
pub fn random_code<R: Rng + ?Sized>(category: ProductCategory, rng: &mut R) -> String {
    format!(
        "{}{:0width$}",
        category.prefix(),
        rng.gen_range(0..CODE_SPACE),
        width = CODE_DIGITS
    )
}

/// Whether `code` has the `<2 uppercase letters><6 digits>` shape
pub fn is_valid_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 2 + CODE_DIGITS
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..].iter().all(u8::is_ascii_digit)
}

/// Canonical form of a user-supplied code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Draw candidates until `is_taken` reports a free one.
///
/// Fails with `CodeGenerationExhausted` after `max_attempts` collisions.
pub fn generate_unique_code<R, F>(
    category: ProductCategory,
    rng: &mut R,
    max_attempts: u32,
    mut is_taken: F,
) -> DomainResult<String>
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> bool,
{
    for _ in 0..max_attempts {
        let candidate = random_code(category, rng);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(DomainError::CodeGenerationExhausted {
        category: category.display_name().to_string(),
        attempts: max_attempts,
    })
}
