//! Reed-Solomon account address codec.
//!
//! An Apollo account id (u64) is written as 13 base-32 symbols followed by
//! 4 parity symbols of a (17,13) Reed-Solomon code over GF(32). The 17
//! symbols are shuffled through a fixed permutation and rendered with a
//! 32-character alphabet that omits `0`, `1`, `I` and `O`:
//!
//! ```text
//! APL-XXXX-XXXX-XXXX-XXXXX
//! ```
//!
//! Decoding tolerates any characters outside the alphabet (dashes, spaces)
//! and reports a bad checksum by returning `None`, since mistyped
//! addresses are an expected input.

use tracing::error;

use crate::PrimitivesError;

/// Address prefix used on the Apollo network.
pub const DEFAULT_PREFIX: &str = "APL";

const ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Output position -> codeword index.
const CODEWORD_MAP: [usize; 17] = [3, 2, 1, 0, 7, 6, 5, 4, 13, 14, 15, 16, 12, 8, 9, 10, 11];

/// Powers of the GF(32) generator.
const GEXP: [u8; 32] = [
    1, 2, 4, 8, 16, 5, 10, 20, 13, 26, 17, 7, 14, 28, 29, 31, 27, 19, 3, 6, 12, 24, 21, 15, 30, 25,
    23, 11, 22, 9, 18, 1,
];

/// Discrete logarithms in GF(32); index 0 is unused.
const GLOG: [u8; 32] = [
    0, 0, 1, 18, 2, 5, 19, 11, 3, 29, 6, 27, 20, 8, 12, 23, 4, 10, 30, 17, 7, 22, 28, 26, 21, 25,
    9, 16, 13, 14, 24, 15,
];

const DATA_LEN: usize = 13;
const CODEWORD_LEN: usize = 17;

fn gmult(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let idx = (GLOG[a as usize] as usize + GLOG[b as usize] as usize) % 31;
    GEXP[idx]
}

/// Encode an account id as an RS address with the `APL` prefix.
///
/// # Examples
/// ```
/// use apl_primitives::reed_solomon;
/// assert_eq!(reed_solomon::encode(9211698109297098287), "APL-NZKH-MZRE-2CTT-98NPZ");
/// ```
pub fn encode(account_id: u64) -> String {
    encode_with_prefix(account_id, DEFAULT_PREFIX)
}

/// Encode an account id as an RS address with a custom prefix.
///
/// # Arguments
/// * `account_id` - The numeric account id.
/// * `prefix` - Network prefix without the trailing dash.
///
/// # Returns
/// A string of the form `"<prefix>-XXXX-XXXX-XXXX-XXXXX"`.
pub fn encode_with_prefix(account_id: u64, prefix: &str) -> String {
    let mut codeword = [0u8; CODEWORD_LEN];

    // Least significant base-32 digit goes to codeword[0].
    let mut n = account_id;
    for symbol in codeword.iter_mut().take(DATA_LEN) {
        *symbol = (n % 32) as u8;
        n /= 32;
    }

    let mut p = [0u8; 4];
    for i in (0..DATA_LEN).rev() {
        let fb = codeword[i] ^ p[3];
        p[3] = p[2] ^ gmult(30, fb);
        p[2] = p[1] ^ gmult(6, fb);
        p[1] = p[0] ^ gmult(9, fb);
        p[0] = gmult(17, fb);
    }
    codeword[DATA_LEN..].copy_from_slice(&p);

    let mut out = String::with_capacity(prefix.len() + 1 + CODEWORD_LEN + 3);
    out.push_str(prefix);
    out.push('-');
    for (j, &idx) in CODEWORD_MAP.iter().enumerate() {
        out.push(ALPHABET[codeword[idx] as usize] as char);
        if (j & 3) == 3 && j < DATA_LEN {
            out.push('-');
        }
    }
    out
}

/// Decode an RS address back to the decimal account id string.
///
/// A leading `APL-` is stripped. Characters outside the address alphabet
/// are skipped. Returns `None` (and logs the reason) when the address does
/// not carry exactly 17 symbols or the checksum does not hold.
///
/// The returned string is the decimal value of the 13 data symbols, which
/// may exceed `u64::MAX` for hand-crafted inputs; use [`parse_account_id`]
/// to obtain a numeric id.
pub fn decode(address: &str) -> Option<String> {
    let body = address
        .strip_prefix(DEFAULT_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(address);

    let mut codeword = [0u8; CODEWORD_LEN];
    let mut len = 0usize;
    for c in body.bytes() {
        let Some(pos) = ALPHABET.iter().position(|&a| a == c) else {
            continue;
        };
        if len == CODEWORD_LEN {
            error!(address = %address, "account address codeword too long");
            return None;
        }
        codeword[CODEWORD_MAP[len]] = pos as u8;
        len += 1;
    }

    if len != CODEWORD_LEN || !is_codeword_valid(&codeword) {
        error!(address = %address, "account address codeword invalid");
        return None;
    }

    let value = codeword[..DATA_LEN]
        .iter()
        .rev()
        .fold(0u128, |acc, &d| acc * 32 + d as u128);
    Some(value.to_string())
}

/// Decode an RS address into a numeric account id.
///
/// # Returns
/// The account id, or `InvalidAddress` if the checksum fails or the value
/// does not fit in 64 bits.
pub fn parse_account_id(address: &str) -> Result<u64, PrimitivesError> {
    let decimal = decode(address)
        .ok_or_else(|| PrimitivesError::InvalidAddress(address.to_string()))?;
    decimal
        .parse::<u64>()
        .map_err(|_| PrimitivesError::InvalidAddress(format!("{} exceeds 64 bits", address)))
}

/// Syndrome check: all four syndromes of a valid codeword are zero.
fn is_codeword_valid(codeword: &[u8; CODEWORD_LEN]) -> bool {
    let mut sum = 0u8;
    for i in 1..5 {
        let mut t = 0u8;
        for j in 0..31usize {
            if (13..27).contains(&j) {
                continue;
            }
            let pos = if j > 26 { j - 14 } else { j };
            t ^= gmult(codeword[pos], GEXP[(i * j) % 31]);
        }
        sum |= t;
    }
    sum == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_vectors() {
        assert_eq!(encode(9211698109297098287), "APL-NZKH-MZRE-2CTT-98NPZ");
        assert_eq!(encode(15280789184989128625), "APL-JTXK-TPXG-LYLT-F646A");
        assert_eq!(encode(0), "APL-2222-2222-2222-22222");
        assert_eq!(encode(u64::MAX), "APL-ZZZZ-ZZZZ-QY2K-HZZZZ");
    }

    #[test]
    fn test_encode_custom_prefix() {
        assert_eq!(encode_with_prefix(9211698109297098287, "XYZ"), "XYZ-NZKH-MZRE-2CTT-98NPZ");
    }

    #[test]
    fn test_decode_known_vector() {
        assert_eq!(decode("APL-NZKH-MZRE-2CTT-98NPZ").as_deref(), Some("9211698109297098287"));
        assert_eq!(decode("APL-2222-2222-2222-22222").as_deref(), Some("0"));
    }

    #[test]
    fn test_decode_without_prefix_and_dashes() {
        assert_eq!(decode("NZKHMZRE2CTT98NPZ").as_deref(), Some("9211698109297098287"));
        assert_eq!(decode("NZKH MZRE 2CTT 98NPZ").as_deref(), Some("9211698109297098287"));
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        assert_eq!(decode("APL-NZKH-MZRE-2CTT-98NPA"), None);
        assert_eq!(decode("APL-2222-2222-2222-22223"), None);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(decode("APL-NZKH-MZRE-2CTT-98NP"), None);
        assert_eq!(decode("APL-NZKH-MZRE-2CTT-98NPZZ"), None);
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_parse_account_id() {
        assert_eq!(parse_account_id("APL-NZKH-MZRE-2CTT-98NPZ").unwrap(), 9211698109297098287);
        assert_eq!(parse_account_id("APL-ZZZZ-ZZZZ-QY2K-HZZZZ").unwrap(), u64::MAX);
        assert!(matches!(
            parse_account_id("APL-NZKH-MZRE-2CTT-98NPA"),
            Err(PrimitivesError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_codeword_validity_of_encoded_ids() {
        for id in [1u64, 31, 32, 1_000_000, 1 << 40, u64::MAX - 1] {
            let rs = encode(id);
            assert_eq!(decode(&rs), Some(id.to_string()), "round trip failed for {}", id);
        }
    }
}
