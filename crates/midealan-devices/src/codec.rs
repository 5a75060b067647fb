/*!
 * Field codec primitives.
 *
 * Pure bit-level transformations shared by every device body. None of these
 * functions fail: values outside a field's enumeration decode to a sentinel.
 */

/// Mask of the shifted-nibble mode field (bits 1-4)
pub const SHIFTED_MODE_MASK: u8 = 0x1E;

/// Low bit that always accompanies a shifted-nibble mode
pub const SHIFTED_MODE_POWER_BIT: u8 = 0x01;

/// Test a flag bit
#[inline]
pub fn flag(byte: u8, mask: u8) -> bool {
    byte & mask != 0
}

/// Encode a flag bit
#[inline]
pub fn encode_flag(value: bool, mask: u8) -> u8 {
    if value {
        mask
    } else {
        0
    }
}

/// Decode a mode stored as a single set bit: returns its 1-based position.
///
/// Zero decodes to 0. With several bits set the highest one wins.
#[inline]
pub fn decode_bit_position(byte: u8, mask: u8) -> u8 {
    (u8::BITS - (byte & mask).leading_zeros()) as u8
}

/// Encode a 1-based bit position (`1 << (mode - 1)`); 0 and positions past
/// bit 7 encode to no bit.
#[inline]
pub fn encode_bit_position(mode: u8) -> u8 {
    match mode {
        1..=8 => 1 << (mode - 1),
        _ => 0,
    }
}

/// Encode a shifted-nibble mode: `1 | ((mode + 1) << 1) & 0x1E`.
///
/// The low bit is always set, so a mode on the wire also reads as power on.
#[inline]
pub fn encode_shifted_mode(mode: u8) -> u8 {
    let shifted = ((u16::from(mode) + 1) << 1) as u8;
    SHIFTED_MODE_POWER_BIT | (shifted & SHIFTED_MODE_MASK)
}

/// Decode a shifted-nibble mode. A zero field means no mode is set.
#[inline]
pub fn decode_shifted_mode(byte: u8) -> Option<u8> {
    match (byte & SHIFTED_MODE_MASK) >> 1 {
        0 => None,
        raw => Some(raw - 1),
    }
}

/// Join an integer byte and a tenths byte into one value
#[inline]
pub fn join_tenths(integer: u8, tenths: u8) -> f64 {
    f64::from(integer) + f64::from(tenths) / 10.0
}

/// Split a value into its integer byte and tenths byte, each masked to a byte
#[inline]
pub fn split_tenths(value: f64) -> (u8, u8) {
    let integer = (value.trunc() as i64 & 0xFF) as u8;
    let tenths = (((value - value.floor()) * 10.0).round() as i64 & 0xFF) as u8;
    (integer, tenths)
}

/// Gate a requested value to the closed range `[1, max]`.
///
/// Out-of-range values are dropped, never wrapped.
#[inline]
pub fn range_gate(value: i64, max: u8) -> Option<u8> {
    if (1..=i64::from(max)).contains(&value) {
        Some(value as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        assert!(flag(0x80, 0x80));
        assert!(!flag(0x7F, 0x80));
        assert_eq!(encode_flag(true, 0x08), 0x08);
        assert_eq!(encode_flag(false, 0x08), 0x00);
    }

    #[test]
    fn test_bit_position_single_bits() {
        for mode in 1..=5u8 {
            let encoded = encode_bit_position(mode);
            assert_eq!(encoded.count_ones(), 1);
            assert_eq!(decode_bit_position(encoded, 0x1F), mode);
        }
    }

    #[test]
    fn test_bit_position_degenerate_inputs() {
        assert_eq!(decode_bit_position(0x00, 0x1F), 0);
        // Bits outside the mask are ignored
        assert_eq!(decode_bit_position(0x80, 0x1F), 0);
        // Several bits: highest wins, no panic
        assert_eq!(decode_bit_position(0x05, 0x1F), 3);
        assert_eq!(encode_bit_position(0), 0);
        assert_eq!(encode_bit_position(9), 0);
    }

    #[test]
    fn test_shifted_mode_inverse() {
        for mode in 0..=14u8 {
            let encoded = encode_shifted_mode(mode);
            assert_eq!(encoded & SHIFTED_MODE_POWER_BIT, SHIFTED_MODE_POWER_BIT);
            assert_eq!(decode_shifted_mode(encoded), Some(mode));
        }
    }

    #[test]
    fn test_shifted_mode_known_values() {
        assert_eq!(encode_shifted_mode(0), 0x03);
        assert_eq!(encode_shifted_mode(2), 0x07);
        assert_eq!(encode_shifted_mode(12), 0x1B);
        assert_eq!(encode_shifted_mode(14), 0x1F);
        // 15 overflows the nibble and reads back as "no mode"
        assert_eq!(decode_shifted_mode(encode_shifted_mode(15)), None);
        assert_eq!(decode_shifted_mode(0x01), None);
        assert_eq!(decode_shifted_mode(0x00), None);
    }

    #[test]
    fn test_tenths_round_trip() {
        for integer in 0..=99u8 {
            for tenths in 0..=9u8 {
                let value = join_tenths(integer, tenths);
                assert_eq!(split_tenths(value), (integer, tenths), "value {}", value);
            }
        }
    }

    #[test]
    fn test_split_tenths_rounds() {
        assert_eq!(split_tenths(26.5), (26, 5));
        assert_eq!(split_tenths(17.0), (17, 0));
        assert_eq!(split_tenths(23.04), (23, 0));
        assert_eq!(split_tenths(23.06), (23, 1));
    }

    #[test]
    fn test_range_gate() {
        assert_eq!(range_gate(1, 26), Some(1));
        assert_eq!(range_gate(26, 26), Some(26));
        assert_eq!(range_gate(0, 26), None);
        assert_eq!(range_gate(27, 26), None);
        assert_eq!(range_gate(283, 26), None);
        assert_eq!(range_gate(-1, 26), None);
    }
}
