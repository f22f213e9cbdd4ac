//! Key name resolution
//!
//! Maps the fixed vocabulary of key names used in `K<name>` fields to
//! numeric key codes. Codes follow the conventional virtual-key numbering
//! so sinks bridging to real injection APIs need no translation table.

use crate::{Error, Result};

pub const VK_BACKSPACE: u16 = 0x08;
pub const VK_TAB: u16 = 0x09;
pub const VK_ENTER: u16 = 0x0A;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CTRL: u16 = 0x11;
pub const VK_ALT: u16 = 0x12;
pub const VK_LEFT: u16 = 0x25;
pub const VK_UP: u16 = 0x26;
pub const VK_RIGHT: u16 = 0x27;
pub const VK_DOWN: u16 = 0x28;
pub const VK_DELETE: u16 = 0x7F;
pub const VK_INSERT: u16 = 0x9B;

/// Resolve a key name to a key code.
///
/// Accepts the named keys SHIFT, TAB, CTRL, ALT, BACKSPACE, INSERT, DELETE,
/// UP, LEFT, DOWN, RIGHT, ENTER, or a single letter/digit (letters resolve
/// to their uppercase codepoint). Anything else is an [`Error::UnknownKey`].
pub fn key_code(name: &str) -> Result<u16> {
    match name {
        "SHIFT" => Ok(VK_SHIFT),
        "TAB" => Ok(VK_TAB),
        "CTRL" => Ok(VK_CTRL),
        "ALT" => Ok(VK_ALT),
        "BACKSPACE" => Ok(VK_BACKSPACE),
        "INSERT" => Ok(VK_INSERT),
        "DELETE" => Ok(VK_DELETE),
        "UP" => Ok(VK_UP),
        "LEFT" => Ok(VK_LEFT),
        "DOWN" => Ok(VK_DOWN),
        "RIGHT" => Ok(VK_RIGHT),
        "ENTER" => Ok(VK_ENTER),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => {
                    Ok(c.to_ascii_uppercase() as u16)
                }
                _ => Err(Error::UnknownKey(name.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        assert_eq!(key_code("SHIFT").unwrap(), VK_SHIFT);
        assert_eq!(key_code("TAB").unwrap(), VK_TAB);
        assert_eq!(key_code("CTRL").unwrap(), VK_CTRL);
        assert_eq!(key_code("ALT").unwrap(), VK_ALT);
        assert_eq!(key_code("BACKSPACE").unwrap(), VK_BACKSPACE);
        assert_eq!(key_code("INSERT").unwrap(), VK_INSERT);
        assert_eq!(key_code("DELETE").unwrap(), VK_DELETE);
        assert_eq!(key_code("UP").unwrap(), VK_UP);
        assert_eq!(key_code("LEFT").unwrap(), VK_LEFT);
        assert_eq!(key_code("DOWN").unwrap(), VK_DOWN);
        assert_eq!(key_code("RIGHT").unwrap(), VK_RIGHT);
        assert_eq!(key_code("ENTER").unwrap(), VK_ENTER);
    }

    #[test]
    fn test_letters_resolve_uppercase() {
        assert_eq!(key_code("a").unwrap(), b'A' as u16);
        assert_eq!(key_code("A").unwrap(), b'A' as u16);
        assert_eq!(key_code("z").unwrap(), b'Z' as u16);
    }

    #[test]
    fn test_digits_resolve_to_codepoint() {
        assert_eq!(key_code("0").unwrap(), b'0' as u16);
        assert_eq!(key_code("9").unwrap(), b'9' as u16);
    }

    #[test]
    fn test_unknown_names_fail() {
        assert!(matches!(key_code("NOPE"), Err(Error::UnknownKey(_))));
        assert!(matches!(key_code(""), Err(Error::UnknownKey(_))));
        assert!(matches!(key_code("AB"), Err(Error::UnknownKey(_))));
    }
}
