use std::ops::Range;

use rustc_hash::FxHashSet;

use crate::cff::argstack::ArgumentsStack;
use crate::cff::index::Index;
use crate::cff::operator::{charstring, escaped, Operator, TWO_BYTE_OPERATOR_MARK};
use crate::stream::Reader;
use crate::{Error, Result};

/// The number of slots of the transient array used by `put` and `get`.
const TRANSIENT_ARRAY_LEN: usize = 32;

/// The subroutines referenced by one glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct UsageDelta {
    /// Unbiased indices into the local Subrs INDEX of the glyph's Font DICT.
    pub local: FxHashSet<u32>,
    /// Unbiased indices into the Global Subrs INDEX.
    pub global: FxHashSet<u32>,
    /// Standard encoding codes of the base and accent glyphs of a `seac`.
    pub components: Vec<u8>,
}

/// A Subrs INDEX together with the bias its callers apply.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Subroutines<'a> {
    index: &'a Index,
    bias: i32,
}

impl<'a> Subroutines<'a> {
    pub fn new(index: &'a Index, charstring_type: i32) -> Self {
        Self { index, bias: calc_subroutine_bias(charstring_type, index.len()) }
    }

    /// Remove the bias from a subroutine number. Returns `None` if there is no
    /// such subroutine.
    fn resolve(&self, biased: i32) -> Option<(u32, Range<usize>)> {
        let index = u32::try_from(biased.checked_add(self.bias)?).ok()?;
        let range = self.index.range(usize::try_from(index).ok()?)?;
        Some((index, range))
    }
}

/// The bias that is added to the operand of `callsubr` and `callgsubr`.
pub(crate) fn calc_subroutine_bias(charstring_type: i32, len: usize) -> i32 {
    if charstring_type == 1 {
        0
    } else if len < 1240 {
        107
    } else if len < 33900 {
        1131
    } else {
        32768
    }
}

/// The number of bytes of a `hintmask` or `cntrmask` operand.
///
/// Always at least one byte, even when no hints were declared.
pub(crate) fn hint_mask_len(hint_count: usize) -> usize {
    let len = hint_count / 8;
    if hint_count % 8 != 0 || len == 0 {
        len + 1
    } else {
        len
    }
}

/// How execution continues after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    /// The current subroutine is done.
    Return,
    /// The whole glyph is done.
    EndChar,
}

/// Finds the subroutines a glyph calls, directly or through other subroutines.
///
/// The scanner runs the charstring the way a renderer would, minus the drawing.
/// Every subroutine body is executed at most once per glyph, so hints it
/// declares count towards the glyph's masks, while repeated calls cost nothing.
pub(crate) struct Scanner<'a> {
    data: &'a [u8],
    charstring_type: i32,
    global: Subroutines<'a>,
    local: Option<Subroutines<'a>>,
    max_depth: u8,
    stack: ArgumentsStack,
    ps_stack: Vec<Option<i32>>,
    transient: [Option<i32>; TRANSIENT_ARRAY_LEN],
    hint_count: usize,
    /// Subroutines whose body was executed, keyed by locality and index.
    scanned: FxHashSet<(bool, u32)>,
    usage: UsageDelta,
}

impl<'a> Scanner<'a> {
    pub fn new(
        data: &'a [u8],
        charstring_type: i32,
        global: Subroutines<'a>,
        local: Option<Subroutines<'a>>,
        max_depth: u8,
    ) -> Self {
        Self {
            data,
            charstring_type,
            global,
            local,
            max_depth,
            stack: ArgumentsStack::new(),
            ps_stack: vec![],
            transient: [None; TRANSIENT_ARRAY_LEN],
            hint_count: 0,
            scanned: FxHashSet::default(),
            usage: UsageDelta::default(),
        }
    }

    /// Scan the charstring stored at `range` of the font data.
    pub fn scan(mut self, range: Range<usize>) -> Result<UsageDelta> {
        self.run(range, 0)?;
        Ok(self.usage)
    }

    fn run(&mut self, range: Range<usize>, depth: u8) -> Result<Flow> {
        let data = self.data;
        let Some(body) = data.get(range) else {
            return Err(Error::TruncatedInput);
        };

        let mut r = Reader::new(body);
        while !r.at_end() {
            match self.step(&mut r, depth) {
                Ok(Flow::Continue) => {}
                Ok(flow) => return Ok(flow),
                Err(Error::TruncatedInput) => {
                    log::trace!("charstring ends in the middle of an instruction");
                    return Ok(Flow::Return);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Flow::Return)
    }

    fn step(&mut self, r: &mut Reader<'a>, depth: u8) -> Result<Flow> {
        let b0 = r.read::<u8>()?;
        match b0 {
            charstring::SHORT_INT => {
                let n = r.read::<i16>()?;
                self.stack.push(Some(i32::from(n)))?;
            }
            32..=246 => self.stack.push(Some(i32::from(b0) - 139))?,
            247..=250 => {
                let b1 = i32::from(r.read::<u8>()?);
                self.stack.push(Some((i32::from(b0) - 247) * 256 + b1 + 108))?;
            }
            251..=254 => {
                let b1 = i32::from(r.read::<u8>()?);
                self.stack.push(Some(-(i32::from(b0) - 251) * 256 - b1 - 108))?;
            }
            charstring::FIXED_16_16 => {
                let n = r.read::<i32>()?;
                // A plain 32-bit integer in Type 1 charstrings.
                let value = if self.charstring_type == 1 {
                    Some(n)
                } else if n & 0xFFFF == 0 {
                    Some(n >> 16)
                } else {
                    None
                };
                self.stack.push(value)?;
            }
            TWO_BYTE_OPERATOR_MARK => {
                let b1 = r.read::<u8>()?;
                self.escaped(b1)?;
            }
            charstring::HSTEM
            | charstring::VSTEM
            | charstring::HSTEMHM
            | charstring::VSTEMHM => self.count_hints(),
            charstring::HINT_MASK | charstring::COUNTER_MASK
                if self.charstring_type != 1 =>
            {
                // Operands before the first mask are implicit vstem hints.
                self.count_hints();
                r.skip_bytes(hint_mask_len(self.hint_count))?;
            }
            charstring::CALL_LOCAL_SUBROUTINE => return self.call_subroutine(true, depth),
            charstring::CALL_GLOBAL_SUBROUTINE => {
                return self.call_subroutine(false, depth)
            }
            charstring::RETURN => return Ok(Flow::Return),
            charstring::ENDCHAR => {
                // bchar achar, optionally preceded by the width and the offsets.
                if self.charstring_type != 1 && matches!(self.stack.len(), 4 | 5) {
                    self.seac();
                }
                return Ok(Flow::EndChar);
            }
            _ => self.clear(Operator::OneByte(b0)),
        }

        Ok(Flow::Continue)
    }

    fn count_hints(&mut self) {
        self.hint_count += self.stack.len() / 2;
        self.stack.clear();
    }

    fn call_subroutine(&mut self, local: bool, depth: u8) -> Result<Flow> {
        let biased = self.stack.pop();
        let subrs = if local { self.local } else { Some(self.global) };

        let Some(subrs) = subrs else {
            log::trace!("skipping callsubr in a font without local subroutines");
            return Ok(Flow::Continue);
        };

        let Some(biased) = biased else {
            log::trace!("skipping subroutine call with an unknown operand");
            return Ok(Flow::Continue);
        };

        let Some((index, range)) = subrs.resolve(biased) else {
            log::trace!("skipping call to subroutine {biased}, which is out of range");
            return Ok(Flow::Continue);
        };

        if local {
            self.usage.local.insert(index);
        } else {
            self.usage.global.insert(index);
        }

        if depth >= self.max_depth {
            log::warn!("subroutine nesting limit of {} reached", self.max_depth);
            return Ok(Flow::Continue);
        }

        if !self.scanned.insert((local, index)) {
            return Ok(Flow::Continue);
        }

        match self.run(range, depth + 1)? {
            Flow::EndChar => Ok(Flow::EndChar),
            _ => Ok(Flow::Continue),
        }
    }

    fn escaped(&mut self, op: u8) -> Result<()> {
        match op {
            escaped::AND
            | escaped::OR
            | escaped::EQ
            | escaped::ADD
            | escaped::SUB
            | escaped::DIV
            | escaped::MUL => self.compute(2)?,
            escaped::ABS | escaped::NEG | escaped::SQRT | escaped::NOT => self.compute(1)?,
            escaped::DROP => {
                self.stack.pop();
            }
            escaped::PUT => {
                let i = self.stack.pop();
                let value = self.stack.pop();
                if let Some(slot) = i.and_then(|i| self.transient_slot(i)) {
                    self.transient[slot] = value;
                }
            }
            escaped::GET => {
                let i = self.stack.pop();
                let value = i.and_then(|i| self.transient_slot(i)).and_then(|i| self.transient[i]);
                self.stack.push(value)?;
            }
            escaped::IF_ELSE => {
                let v2 = self.stack.pop();
                let v1 = self.stack.pop();
                let s2 = self.stack.pop();
                let s1 = self.stack.pop();
                let value = match (v1, v2) {
                    (Some(v1), Some(v2)) if v1 <= v2 => s1,
                    (Some(_), Some(_)) => s2,
                    _ => None,
                };
                self.stack.push(value)?;
            }
            escaped::RANDOM => self.stack.push(None)?,
            escaped::DUP => self.stack.dup()?,
            escaped::EXCH => self.stack.exch(),
            escaped::INDEX => {
                let value = match self.stack.pop() {
                    // A negative index copies the top value.
                    Some(i) => self.stack.get_from_top(usize::try_from(i).unwrap_or(0)),
                    None => None,
                };
                self.stack.push(value)?;
            }
            escaped::ROLL => {
                let j = self.stack.pop();
                let n = self.stack.pop();
                if let (Some(n), Some(j)) = (n, j) {
                    if let Ok(n) = usize::try_from(n) {
                        self.stack.roll(n, j);
                    }
                }
            }
            escaped::CALL_OTHER_SUBROUTINE if self.charstring_type == 1 => {
                self.call_other_subroutine()
            }
            escaped::POP if self.charstring_type == 1 => {
                let value = self.ps_stack.pop().flatten();
                self.stack.push(value)?;
            }
            escaped::SEAC if self.charstring_type == 1 => self.seac(),
            _ => self.clear(Operator::TwoByte(op)),
        }

        Ok(())
    }

    /// Run an operator that only consumes operands.
    fn clear(&mut self, op: Operator) {
        log::trace!("{} takes {} operands", op.charstring_name(), self.stack.len());
        self.stack.clear();
    }

    /// Record the components of an accented glyph and clear the stack.
    fn seac(&mut self) {
        let achar = self.stack.pop();
        let bchar = self.stack.pop();
        for code in [bchar, achar] {
            match code.and_then(|code| u8::try_from(code).ok()) {
                Some(code) => self.usage.components.push(code),
                None => log::warn!("skipping accent component with invalid code"),
            }
        }
        self.stack.clear();
    }

    /// Replace the topmost `n` operands with the unknown result of a computation.
    fn compute(&mut self, n: usize) -> Result<()> {
        self.stack.pop_n(n);
        self.stack.push(None)
    }

    fn transient_slot(&self, i: i32) -> Option<usize> {
        usize::try_from(i).ok().filter(|&i| i < TRANSIENT_ARRAY_LEN)
    }

    /// `arg1 ... argn n othersubr# callothersubr` moves the arguments to the
    /// PostScript stack, from where `pop` brings them back.
    fn call_other_subroutine(&mut self) {
        let _othersubr = self.stack.pop();
        match self.stack.pop().and_then(|n| usize::try_from(n).ok()) {
            Some(n) if n <= self.stack.len() => {
                let args = self.stack.pop_n(n);
                self.ps_stack.extend(args);
            }
            _ => self.stack.clear(),
        }
    }
}
