use std::fmt::{self, Debug, Formatter};

pub(crate) const TWO_BYTE_OPERATOR_MARK: u8 = 12;

/// A DICT or charstring operator, either a single byte or escaped with
/// [`TWO_BYTE_OPERATOR_MARK`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Operator {
    OneByte(u8),
    TwoByte(u8),
}

impl Operator {
    /// The name of this operator when it appears in a DICT.
    pub fn dict_name(self) -> &'static str {
        let name = match self {
            Operator::OneByte(b) => DICT_OPERATORS.get(usize::from(b)),
            Operator::TwoByte(b) => DICT_ESCAPED_OPERATORS.get(usize::from(b)),
        };
        name.copied().unwrap_or("reserved")
    }

    /// The name of this operator when it appears in a charstring.
    pub fn charstring_name(self) -> &'static str {
        let name = match self {
            Operator::OneByte(b) => CHARSTRING_OPERATORS.get(usize::from(b)),
            Operator::TwoByte(b) => CHARSTRING_ESCAPED_OPERATORS.get(usize::from(b)),
        };
        name.copied().unwrap_or("reserved")
    }

    /// The encoded form of the operator.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Operator::OneByte(b) => vec![b],
            Operator::TwoByte(b) => vec![TWO_BYTE_OPERATOR_MARK, b],
        }
    }
}

impl Debug for Operator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(self.dict_name())
    }
}

// Adobe Technical Note #5176, Table 9 and Table 10.
const DICT_OPERATORS: [&str; 22] = [
    "version", "Notice", "FullName", "FamilyName", "Weight", "FontBBox", "BlueValues",
    "OtherBlues", "FamilyBlues", "FamilyOtherBlues", "StdHW", "StdVW", "escape",
    "UniqueID", "XUID", "charset", "Encoding", "CharStrings", "Private", "Subrs",
    "defaultWidthX", "nominalWidthX",
];

const DICT_ESCAPED_OPERATORS: [&str; 39] = [
    "Copyright", "isFixedPitch", "ItalicAngle", "UnderlinePosition",
    "UnderlineThickness", "PaintType", "CharstringType", "FontMatrix", "StrokeWidth",
    "BlueScale", "BlueShift", "BlueFuzz", "StemSnapH", "StemSnapV", "ForceBold",
    "reserved", "reserved", "LanguageGroup", "ExpansionFactor", "initialRandomSeed",
    "SyntheticBase", "PostScript", "BaseFontName", "BaseFontBlend", "reserved",
    "reserved", "reserved", "reserved", "reserved", "reserved", "ROS",
    "CIDFontVersion", "CIDFontRevision", "CIDFontType", "CIDCount", "UIDBase",
    "FDArray", "FDSelect", "FontName",
];

// Adobe Technical Note #5177, Appendix A. Slots 9 and 13 carry their
// Type 1 meaning, the escaped table also includes the Type 1 operators.
const CHARSTRING_OPERATORS: [&str; 32] = [
    "reserved", "hstem", "reserved", "vstem", "vmoveto", "rlineto", "hlineto",
    "vlineto", "rrcurveto", "closepath", "callsubr", "return", "escape", "hsbw",
    "endchar", "reserved", "reserved", "reserved", "hstemhm", "hintmask", "cntrmask",
    "rmoveto", "hmoveto", "vstemhm", "rcurveline", "rlinecurve", "vvcurveto",
    "hhcurveto", "shortint", "callgsubr", "vhcurveto", "hvcurveto",
];

const CHARSTRING_ESCAPED_OPERATORS: [&str; 48] = [
    "dotsection", "vstem3", "hstem3", "and", "or", "not", "seac", "sbw", "reserved",
    "abs", "add", "sub", "div", "reserved", "neg", "eq", "callothersubr", "pop",
    "drop", "reserved", "put", "get", "ifelse", "random", "mul", "reserved", "sqrt",
    "dup", "exch", "index", "roll", "reserved", "reserved", "setcurrentpoint", "hflex",
    "flex", "hflex1", "flex1", "reserved", "reserved", "reserved", "reserved",
    "reserved", "reserved", "reserved", "reserved", "reserved", "reserved",
];

/// Single-byte charstring operators.
pub(crate) mod charstring {
    pub const HSTEM: u8 = 1;
    pub const VSTEM: u8 = 3;
    pub const CALL_LOCAL_SUBROUTINE: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ENDCHAR: u8 = 14;
    pub const HSTEMHM: u8 = 18;
    pub const HINT_MASK: u8 = 19;
    pub const COUNTER_MASK: u8 = 20;
    pub const VSTEMHM: u8 = 23;
    pub const SHORT_INT: u8 = 28;
    pub const CALL_GLOBAL_SUBROUTINE: u8 = 29;
    pub const FIXED_16_16: u8 = 255;
}

/// Charstring operators that follow [`TWO_BYTE_OPERATOR_MARK`].
pub(crate) mod escaped {
    pub const AND: u8 = 3;
    pub const OR: u8 = 4;
    pub const NOT: u8 = 5;
    /// Type 1 only.
    pub const SEAC: u8 = 6;
    pub const ABS: u8 = 9;
    pub const ADD: u8 = 10;
    pub const SUB: u8 = 11;
    pub const DIV: u8 = 12;
    pub const NEG: u8 = 14;
    pub const EQ: u8 = 15;
    pub const CALL_OTHER_SUBROUTINE: u8 = 16;
    pub const POP: u8 = 17;
    pub const DROP: u8 = 18;
    pub const PUT: u8 = 20;
    pub const GET: u8 = 21;
    pub const IF_ELSE: u8 = 22;
    pub const RANDOM: u8 = 23;
    pub const MUL: u8 = 24;
    pub const SQRT: u8 = 26;
    pub const DUP: u8 = 27;
    pub const EXCH: u8 = 28;
    pub const INDEX: u8 = 29;
    pub const ROLL: u8 = 30;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_names() {
        assert_eq!(Operator::OneByte(17).dict_name(), "CharStrings");
        assert_eq!(Operator::OneByte(19).dict_name(), "Subrs");
        assert_eq!(Operator::TwoByte(30).dict_name(), "ROS");
        assert_eq!(Operator::TwoByte(38).dict_name(), "FontName");
        assert_eq!(Operator::TwoByte(39).dict_name(), "reserved");
    }

    #[test]
    fn charstring_names() {
        assert_eq!(Operator::OneByte(charstring::HINT_MASK).charstring_name(), "hintmask");
        assert_eq!(Operator::OneByte(charstring::CALL_GLOBAL_SUBROUTINE).charstring_name(), "callgsubr");
        assert_eq!(Operator::TwoByte(escaped::ROLL).charstring_name(), "roll");
        assert_eq!(Operator::TwoByte(37).charstring_name(), "flex1");
        assert_eq!(Operator::TwoByte(47).charstring_name(), "reserved");
    }

    #[test]
    fn encoding() {
        assert_eq!(Operator::OneByte(18).to_bytes(), vec![18]);
        assert_eq!(Operator::TwoByte(36).to_bytes(), vec![12, 36]);
    }
}
