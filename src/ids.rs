// SPDX-License-Identifier: MIT

//! Random document ID generation.
//!
//! Entities are keyed by 64-bit ids minted here; Firestore document ids are
//! the decimal rendering of these values.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Generate a random non-zero u64 id.
pub fn generate_id() -> Result<u64, AppError> {
    let rng = SystemRandom::new();
    loop {
        let mut bytes = [0u8; 8];
        rng.fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate random id")))?;
        // Keep ids inside the 53-bit range so JSON consumers keep precision.
        let id = u64::from_be_bytes(bytes) >> 11;
        if id != 0 {
            return Ok(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_nonzero_and_distinct() {
        let a = generate_id().unwrap();
        let b = generate_id().unwrap();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_ids_fit_in_53_bits() {
        for _ in 0..100 {
            let id = generate_id().unwrap();
            assert!(id < (1u64 << 53));
        }
    }
}
