use std::ops::Range;

use crate::cff::number::{is_dict_operand, Number};
use crate::cff::operator::{Operator, TWO_BYTE_OPERATOR_MARK};
use crate::stream::Reader;
use crate::{Error, Result};

/// The maximum number of operands a DICT operator can take.
const MAX_OPERANDS_LEN: usize = 48;

/// One operator of a DICT together with its operands.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DictEntry {
    pub operator: Operator,
    pub operands: Vec<Number>,
    /// The bytes of the entry in the font data, operands and operator included.
    pub range: Range<usize>,
}

impl DictEntry {
    /// The single operand of an offset-valued key, like `CharStrings`.
    pub fn offset(&self) -> Result<usize> {
        match self.operands.as_slice() {
            [n] => n.as_offset().ok_or(Error::MalformedDict),
            _ => Err(Error::MalformedDict),
        }
    }

    /// The `(size, offset)` operand pair of a `Private` key, as a range.
    pub fn size_and_offset(&self) -> Result<Range<usize>> {
        match self.operands.as_slice() {
            [len, offset] => {
                let len = len.as_offset().ok_or(Error::MalformedDict)?;
                let start = offset.as_offset().ok_or(Error::MalformedDict)?;
                let end = start.checked_add(len).ok_or(Error::MalformedDict)?;
                Ok(start..end)
            }
            _ => Err(Error::MalformedDict),
        }
    }

    /// The operand at `index` as an integer.
    pub fn int(&self, index: usize) -> Result<i32> {
        self.operands
            .get(index)
            .and_then(Number::as_i32)
            .ok_or(Error::MalformedDict)
    }
}

/// Decodes the entries of a DICT one at a time.
pub(crate) struct DictionaryParser<'a> {
    data: &'a [u8],
    offset: usize,
    end: usize,
}

impl<'a> DictionaryParser<'a> {
    /// Create a parser over the DICT stored at `range` of `data`.
    pub fn new(data: &'a [u8], range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > data.len() {
            return Err(Error::TruncatedInput);
        }

        Ok(Self { data, offset: range.start, end: range.end })
    }

    /// Decode the next entry, or return `None` at the end of the DICT.
    pub fn parse_next(&mut self) -> Result<Option<DictEntry>> {
        if self.offset >= self.end {
            return Ok(None);
        }

        let data = &self.data[..self.end];
        let mut r = Reader::new_at(data, self.offset);
        let start = self.offset;
        let mut operands = vec![];

        loop {
            if r.at_end() {
                // Operands without an operator.
                return Err(Error::MalformedDict);
            }

            let b0 = r.peek::<u8>()?;
            if is_dict_operand(b0) {
                if operands.len() == MAX_OPERANDS_LEN {
                    return Err(Error::MalformedDict);
                }
                operands.push(Number::parse(&mut r)?);
                continue;
            }

            r.read::<u8>()?;
            let operator = if b0 == TWO_BYTE_OPERATOR_MARK {
                Operator::TwoByte(r.read::<u8>()?)
            } else {
                Operator::OneByte(b0)
            };

            self.offset = r.offset();
            return Ok(Some(DictEntry { operator, operands, range: start..self.offset }));
        }
    }
}

/// Decode a whole DICT.
pub(crate) fn parse_dict(data: &[u8], range: Range<usize>) -> Result<Vec<DictEntry>> {
    let mut parser = DictionaryParser::new(data, range)?;
    let mut entries = vec![];
    while let Some(entry) = parser.parse_next()? {
        entries.push(entry);
    }
    Ok(entries)
}

/// DICT keys the subsetter needs to look at.
pub(crate) mod operators {
    use crate::cff::operator::Operator;

    // Top DICT
    pub const CHARSET: Operator = Operator::OneByte(15);
    pub const ENCODING: Operator = Operator::OneByte(16);
    pub const CHAR_STRINGS: Operator = Operator::OneByte(17);
    pub const PRIVATE: Operator = Operator::OneByte(18);
    pub const CHARSTRING_TYPE: Operator = Operator::TwoByte(6);
    pub const ROS: Operator = Operator::TwoByte(30);
    pub const CID_COUNT: Operator = Operator::TwoByte(34);
    pub const FD_ARRAY: Operator = Operator::TwoByte(36);
    pub const FD_SELECT: Operator = Operator::TwoByte(37);
    pub const FONT_NAME: Operator = Operator::TwoByte(38);

    // Private DICT
    pub const SUBRS: Operator = Operator::OneByte(19);
}
