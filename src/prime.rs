//! Hash-prime table (C1)
//!
//! Picks a prime stripe/bucket count for a requested size. Using a prime
//! rather than a power of two reduces collision bias when the input hash
//! distribution favours multiples of small numbers (a common case for
//! pointer- or counter-derived hashes) — the same rationale `System.Collections`
//! style hash tables use for their bucket counts.

use crate::error::Error;

/// Tabled primes, roughly doubling, from a small seed up to a prime near
/// `i64::MAX`. `get_prime` first tries to satisfy a request from this table
/// before falling back to trial division.
const PRIMES: &[i64] = &[
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1_103, 1_327, 1_597, 1_931, 2_333, 2_801, 3_371, 4_049, 4_861, 5_839, 7_013, 8_419,
    10_103, 12_143, 14_591, 17_519, 21_023, 25_229, 30_293, 36_353, 43_627, 52_361, 62_851,
    75_431, 90_523, 108_631, 130_363, 156_437, 187_751, 225_307, 270_371, 324_449, 389_357,
    467_237, 560_689, 672_827, 807_403, 968_897, 1_162_687, 1_395_263, 1_674_319, 2_009_191,
    2_411_033, 2_893_249, 3_471_899, 4_166_287, 4_999_559, 5_999_471, 7_199_369,
];

/// Returns `true` iff `n` is prime.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] for `n < 0` (primality of negative
/// numbers is undefined for this table's purposes).
pub fn is_prime(n: i64) -> Result<bool, Error> {
    if n < 0 {
        return Err(Error::InvalidArgument(format!(
            "is_prime: n must be non-negative, got {n}"
        )));
    }
    Ok(is_prime_unchecked(n))
}

fn is_prime_unchecked(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut divisor = 3i64;
    while divisor.saturating_mul(divisor) <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Returns the smallest prime `>= n`.
///
/// Matches the tabled entry when one exists; otherwise probes odd candidates
/// above the table's last entry, skipping multiples of 3, using trial
/// division up to `floor(sqrt(candidate))`. If the probe reaches `i64::MAX`
/// without finding a prime (it is not actually prime, but it is the largest
/// representable stripe count), the search stops and returns `i64::MAX`
/// unconditionally — pinned by a unit test below.
pub fn get_prime(n: i64) -> i64 {
    if n <= PRIMES[0] {
        return PRIMES[0];
    }

    if let Some(&p) = PRIMES.iter().find(|&&p| p >= n) {
        return p;
    }

    // Beyond the table: probe odd candidates, skipping multiples of 3.
    let mut candidate = n | 1;
    while candidate < i64::MAX {
        if candidate % 3 != 0 && is_prime_unchecked(candidate) {
            return candidate;
        }
        candidate = match candidate.checked_add(2) {
            Some(c) => c,
            None => break,
        };
    }

    i64::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_prime_small_values() {
        assert_eq!(is_prime(2).unwrap(), true);
        assert_eq!(is_prime(3).unwrap(), true);
        assert_eq!(is_prime(0).unwrap(), false);
        assert_eq!(is_prime(1).unwrap(), false);
        assert_eq!(is_prime(4).unwrap(), false);
        assert_eq!(is_prime(9).unwrap(), false);
        assert_eq!(is_prime(97).unwrap(), true);
    }

    #[test]
    fn is_prime_rejects_negative() {
        assert!(matches!(is_prime(-1), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn get_prime_matches_table_entries() {
        assert_eq!(get_prime(3), 3);
        assert_eq!(get_prime(8), 11);
        assert_eq!(get_prime(100), 107);
    }

    #[test]
    fn get_prime_beyond_table_uses_trial_division() {
        let p = get_prime(10_000_000);
        assert!(p >= 10_000_000);
        assert!(is_prime_unchecked(p));
    }

    #[test]
    fn get_prime_of_i64_max_is_i64_max() {
        assert_eq!(get_prime(i64::MAX), i64::MAX);
    }

    #[test]
    fn get_prime_is_monotonic() {
        let mut last = 0;
        for n in (0..2000).step_by(37) {
            let p = get_prime(n);
            assert!(p >= n);
            assert!(p >= last);
            last = p;
        }
    }
}
