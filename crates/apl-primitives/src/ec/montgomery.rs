//! Sign resolution for public Montgomery points.
//!
//! A curve25519 public key is only the Montgomery `u` coordinate. Apollo
//! signatures always pair it with the even `v` root, and that choice has to
//! be carried over to the Edwards form `curve25519-dalek` computes in.
//! Dalek exposes no field arithmetic, so the `v` root and the matching
//! Edwards sign bit are worked out here with `num_bigint`.
//!
//! Only public coordinates pass through this module. Secret scalars stay in
//! `curve25519_dalek::Scalar`.

use std::sync::OnceLock;

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::montgomery::MontgomeryPoint;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Montgomery curve coefficient A.
const CURVE_A: u32 = 486662;

fn modulus() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| (BigUint::one() << 255u32) - 19u32)
}

/// Square root mod `2^255 - 19`, if one exists.
///
/// p = 5 (mod 8): the candidate is `a^((p+3)/8)`, fixed up by `sqrt(-1)`
/// when its square comes out as `-a`.
fn sqrt(a: &BigUint) -> Option<BigUint> {
    let p = modulus();
    let candidate = a.modpow(&((p + 3u32) >> 3), p);
    let square = &candidate * &candidate % p;
    if square == *a {
        return Some(candidate);
    }
    if (&square + a) % p == BigUint::zero() {
        let sqrt_m1 = BigUint::from(2u32).modpow(&((p - 1u32) >> 2), p);
        return Some(candidate * sqrt_m1 % p);
    }
    None
}

/// `sqrt(-(A + 2))`, the scale of the map `x = sqrt(-(A + 2)) * u / v`.
fn map_scale() -> &'static BigUint {
    static C: OnceLock<BigUint> = OnceLock::new();
    C.get_or_init(|| sqrt(&(modulus() - (CURVE_A + 2))).unwrap_or_default())
}

/// The Edwards point whose Montgomery form is `(u, v)` with even `v`.
///
/// Bit 255 of `u` is ignored, as in X25519.
///
/// # Returns
/// `None` if `u` is not the coordinate of a curve point (it lies on the twist).
pub(crate) fn even_lift(u: &[u8; 32]) -> Option<EdwardsPoint> {
    let p = modulus();
    let mut masked = *u;
    masked[31] &= 0x7f;

    let u_int = BigUint::from_bytes_le(&masked) % p;
    let rhs = (u_int.pow(3) + BigUint::from(CURVE_A) * &u_int * &u_int + &u_int) % p;
    let mut v = sqrt(&rhs)?;
    if v.bit(0) {
        v = p - v;
    }

    let sign = if v.is_zero() {
        0
    } else {
        let x = map_scale() * &u_int % p * v.modpow(&(p - 2u32), p) % p;
        u8::from(x.bit(0))
    };
    MontgomeryPoint(masked).to_edwards(sign)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;

    #[test]
    fn test_base_point_lifts_to_ed25519_base() {
        let mut nine = [0u8; 32];
        nine[0] = 9;
        assert_eq!(even_lift(&nine), Some(ED25519_BASEPOINT_POINT));
    }

    #[test]
    fn test_lift_keeps_u_coordinate() {
        let u = hex::decode("1b93c9dd30b8fb288463b3fd004c555ceb635c085642ef25d733275fcc33a47b")
            .unwrap();
        let u: [u8; 32] = u.try_into().unwrap();
        let point = even_lift(&u).unwrap();
        assert_eq!(point.to_montgomery().to_bytes(), u);
    }

    #[test]
    fn test_twist_point_has_no_lift() {
        // x = 2 lies on the twist, not on the curve.
        let mut two = [0u8; 32];
        two[0] = 2;
        assert!(even_lift(&two).is_none());
    }

    #[test]
    fn test_sqrt() {
        let four = BigUint::from(4u32);
        let root = sqrt(&four).unwrap();
        assert_eq!(&root * &root % modulus(), four);
        assert!(sqrt(&BigUint::from(2u32)).is_none());
        let scale = map_scale();
        assert_eq!((scale * scale + BigUint::from(CURVE_A + 2)) % modulus(), BigUint::zero());
    }
}
