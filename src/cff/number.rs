use crate::stream::{Reader, Writer};
use crate::{Error, Result};

const FLOAT_STACK_LEN: usize = 64;
const END_OF_FLOAT_FLAG: u8 = 0xf;

/// A DICT operand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Number {
    Integer(i32),
    Real(f64),
}

impl Number {
    /// Parse a DICT operand, starting at its first byte.
    pub fn parse(r: &mut Reader) -> Result<Number> {
        let b0 = r.read::<u8>()?;
        match b0 {
            28 => Ok(Number::Integer(i32::from(r.read::<i16>()?))),
            29 => Ok(Number::Integer(r.read::<i32>()?)),
            30 => parse_real(r).map(Number::Real),
            32..=246 => Ok(Number::Integer(i32::from(b0) - 139)),
            247..=250 => {
                let b1 = i32::from(r.read::<u8>()?);
                Ok(Number::Integer((i32::from(b0) - 247) * 256 + b1 + 108))
            }
            251..=254 => {
                let b1 = i32::from(r.read::<u8>()?);
                Ok(Number::Integer(-(i32::from(b0) - 251) * 256 - b1 - 108))
            }
            _ => Err(Error::MalformedDict),
        }
    }

    /// The value as an integer, if it has no fractional part.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Number::Integer(n) => Some(n),
            Number::Real(n) if n.fract() == 0.0 => Some(n as i32),
            Number::Real(_) => None,
        }
    }

    /// The value as a non-negative offset or length.
    pub fn as_offset(&self) -> Option<usize> {
        usize::try_from(self.as_i32()?).ok()
    }
}

/// Whether a byte starts an operand rather than an operator in a DICT.
pub(crate) fn is_dict_operand(b0: u8) -> bool {
    matches!(b0, 28..=30 | 32..=254)
}

/// Write an integer in its five-byte DICT form.
///
/// Offsets are always written like this, so that the size of a DICT does not
/// depend on the values it ends up holding.
pub(crate) fn write_dict_int(w: &mut Writer, n: i32) {
    w.write::<u8>(29);
    w.write(n);
}

/// The size of an integer written by [`write_dict_int`].
pub(crate) const DICT_INT_SIZE: usize = 5;

// A real number is a sequence of nibbles, terminated by 0xf.
fn parse_real(r: &mut Reader) -> Result<f64> {
    let mut data = [0u8; FLOAT_STACK_LEN];
    let mut idx = 0;

    loop {
        let b1 = r.read::<u8>()?;
        let nibble1 = b1 >> 4;
        let nibble2 = b1 & 15;

        if nibble1 == END_OF_FLOAT_FLAG {
            break;
        }

        idx = parse_float_nibble(nibble1, idx, &mut data)?;

        if nibble2 == END_OF_FLOAT_FLAG {
            break;
        }

        idx = parse_float_nibble(nibble2, idx, &mut data)?;
    }

    std::str::from_utf8(&data[..idx])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::MalformedDict)
}

fn parse_float_nibble(nibble: u8, mut idx: usize, data: &mut [u8]) -> Result<usize> {
    if idx + 2 > FLOAT_STACK_LEN {
        return Err(Error::MalformedDict);
    }

    match nibble {
        0..=9 => data[idx] = b'0' + nibble,
        10 => data[idx] = b'.',
        11 => data[idx] = b'E',
        12 => {
            data[idx] = b'E';
            idx += 1;
            data[idx] = b'-';
        }
        14 => data[idx] = b'-',
        _ => return Err(Error::MalformedDict),
    }

    Ok(idx + 1)
}
