//! Scan code to character translation for the US keyboard layout

use sys7_core::Modifiers;

const fn build(pairs: &[(u8, u8)]) -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < pairs.len() {
        table[pairs[i].0 as usize] = pairs[i].1;
        i += 1;
    }
    table
}

const fn shift_char(c: u8) -> u8 {
    match c {
        b'a'..=b'z' => c - 0x20,
        b'1' => b'!',
        b'2' => b'@',
        b'3' => b'#',
        b'4' => b'$',
        b'5' => b'%',
        b'6' => b'^',
        b'7' => b'&',
        b'8' => b'*',
        b'9' => b'(',
        b'0' => b')',
        b'-' => b'_',
        b'=' => b'+',
        b'[' => b'{',
        b']' => b'}',
        b'\\' => b'|',
        b';' => b':',
        b'\'' => b'"',
        b',' => b'<',
        b'.' => b'>',
        b'/' => b'?',
        b'`' => b'~',
        _ => c,
    }
}

const fn build_shifted(base: &[u8; 128], keypad_first: u8) -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        // keypad keys are not shifted
        table[i] = if (i as u8) < keypad_first {
            shift_char(base[i])
        } else {
            base[i]
        };
        i += 1;
    }
    table
}

const KEYPAD_FIRST: u8 = 0x41;

const US_BASE: [u8; 128] = build(&[
    (0x00, b'a'),
    (0x01, b's'),
    (0x02, b'd'),
    (0x03, b'f'),
    (0x04, b'h'),
    (0x05, b'g'),
    (0x06, b'z'),
    (0x07, b'x'),
    (0x08, b'c'),
    (0x09, b'v'),
    (0x0B, b'b'),
    (0x0C, b'q'),
    (0x0D, b'w'),
    (0x0E, b'e'),
    (0x0F, b'r'),
    (0x10, b'y'),
    (0x11, b't'),
    (0x12, b'1'),
    (0x13, b'2'),
    (0x14, b'3'),
    (0x15, b'4'),
    (0x16, b'6'),
    (0x17, b'5'),
    (0x18, b'='),
    (0x19, b'9'),
    (0x1A, b'7'),
    (0x1B, b'-'),
    (0x1C, b'8'),
    (0x1D, b'0'),
    (0x1E, b']'),
    (0x1F, b'o'),
    (0x20, b'u'),
    (0x21, b'['),
    (0x22, b'i'),
    (0x23, b'p'),
    (0x24, 0x0D),
    (0x25, b'l'),
    (0x26, b'j'),
    (0x27, b'\''),
    (0x28, b'k'),
    (0x29, b';'),
    (0x2A, b'\\'),
    (0x2B, b','),
    (0x2C, b'/'),
    (0x2D, b'n'),
    (0x2E, b'm'),
    (0x2F, b'.'),
    (0x30, 0x09),
    (0x31, b' '),
    (0x32, b'`'),
    (0x33, 0x08),
    (0x34, 0x03),
    (0x35, 0x1B),
    // keypad
    (0x41, b'.'),
    (0x43, b'*'),
    (0x45, b'+'),
    (0x47, 0x1B),
    (0x4B, b'/'),
    (0x4C, 0x03),
    (0x4E, b'-'),
    (0x51, b'='),
    (0x52, b'0'),
    (0x53, b'1'),
    (0x54, b'2'),
    (0x55, b'3'),
    (0x56, b'4'),
    (0x57, b'5'),
    (0x58, b'6'),
    (0x59, b'7'),
    (0x5B, b'8'),
    (0x5C, b'9'),
    // function keys
    (0x60, 0x10),
    (0x61, 0x10),
    (0x62, 0x10),
    (0x63, 0x10),
    (0x64, 0x10),
    (0x65, 0x10),
    (0x67, 0x10),
    (0x6D, 0x10),
    (0x6F, 0x10),
    (0x72, 0x05),
    (0x73, 0x01),
    (0x74, 0x0B),
    (0x75, 0x7F),
    (0x77, 0x04),
    (0x79, 0x0C),
    (0x7A, 0x10),
    (0x78, 0x10),
    (0x76, 0x10),
    // arrows
    (0x7B, 0x1C),
    (0x7C, 0x1D),
    (0x7D, 0x1F),
    (0x7E, 0x1E),
]);

const US_SHIFTED: [u8; 128] = build_shifted(&US_BASE, KEYPAD_FIRST);

/// Translates a scan code under `modifiers`. Returns 0 for keys without a
/// character.
///
/// Shift selects the shifted table. Caps lock inverts the case of letters
/// only. Control folds letters and `@[\]^_` into control characters.
pub fn translate(scan_code: u8, modifiers: Modifiers) -> u8 {
    let idx = scan_code as usize;
    if idx >= US_BASE.len() {
        return 0;
    }
    let mut ch = if modifiers.shift() {
        US_SHIFTED[idx]
    } else {
        US_BASE[idx]
    };
    if modifiers.alpha_lock() && ch.is_ascii_alphabetic() {
        ch ^= 0x20;
    }
    if modifiers.control()
        && (ch.is_ascii_alphabetic() || matches!(ch, b'@' | b'[' | b'\\' | b']' | b'^' | b'_'))
    {
        ch &= 0x1F;
    }
    ch
}

#[cfg(test)]
mod tests {
    use super::*;
    use sys7_core::scan;

    #[test]
    fn base_and_shifted() {
        assert_eq!(translate(scan::A, Modifiers::NONE), b'a');
        assert_eq!(translate(scan::A, Modifiers::SHIFT_KEY), b'A');
        assert_eq!(translate(0x12, Modifiers::RIGHT_SHIFT_KEY), b'!');
        assert_eq!(translate(scan::RETURN, Modifiers::NONE), 0x0D);
        assert_eq!(translate(scan::PERIOD, Modifiers::SHIFT_KEY), b'>');
    }

    #[test]
    fn caps_lock_inverts_letters_only() {
        assert_eq!(translate(scan::A, Modifiers::ALPHA_LOCK), b'A');
        assert_eq!(translate(scan::A, Modifiers::ALPHA_LOCK | Modifiers::SHIFT_KEY), b'a');
        assert_eq!(translate(0x12, Modifiers::ALPHA_LOCK), b'1');
    }

    #[test]
    fn keypad_ignores_shift() {
        assert_eq!(translate(0x53, Modifiers::SHIFT_KEY), b'1');
    }

    #[test]
    fn control_letters() {
        assert_eq!(translate(scan::A, Modifiers::CONTROL_KEY), 0x01);
        assert_eq!(translate(0x12, Modifiers::CONTROL_KEY), b'1');
    }

    #[test]
    fn unmapped_keys_have_no_char() {
        assert_eq!(translate(scan::COMMAND, Modifiers::NONE), 0);
        assert_eq!(translate(0xFF, Modifiers::NONE), 0);
    }
}
