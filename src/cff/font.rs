use std::ops::Range;

use crate::cff::dict::{operators as op, parse_dict, DictEntry};
use crate::cff::encoding::standard_code_sid;
use crate::cff::index::{read_index, Index};
use crate::cff::strings::StringId;
use crate::stream::Reader;
use crate::{Error, Result};

/// One font of a CFF font set.
///
/// All offsets are resolved when the font set is opened, a `Font` is never
/// modified afterwards.
#[derive(Clone, Debug)]
pub struct Font {
    pub(crate) name: String,
    /// The bytes of the name in the Name INDEX, which need not be UTF-8.
    pub(crate) name_range: Range<usize>,
    pub(crate) top_dict: Range<usize>,
    pub(crate) ros: Option<Ros>,
    pub(crate) charstring_type: i32,
    pub(crate) char_strings: Index,
    pub(crate) charset: Charset,
    /// For a CID-keyed font the entries of its FDArray, otherwise exactly one
    /// record holding the Top DICT's Private DICT.
    pub(crate) font_dicts: Vec<FdRecord>,
    pub(crate) fd_select: Option<FdSelect>,
}

impl Font {
    /// The name of the font, as stored in the Name INDEX.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the font is CID-keyed.
    pub fn is_cid(&self) -> bool {
        self.ros.is_some()
    }

    /// The number of glyphs in the font.
    pub fn glyph_count(&self) -> usize {
        self.char_strings.len()
    }

    /// The charstring format, 1 or 2.
    pub fn charstring_type(&self) -> i32 {
        self.charstring_type
    }

    /// The number of Font DICTs. Always 1 for a font that is not CID-keyed.
    pub fn font_dict_count(&self) -> usize {
        self.font_dicts.len()
    }

    /// The Font DICT that the glyph `gid` belongs to.
    pub fn font_dict_index(&self, gid: u16) -> Option<usize> {
        let gid = usize::from(gid);
        if gid >= self.glyph_count() {
            return None;
        }

        match &self.fd_select {
            Some(fd_select) => fd_select.fds.get(gid).copied().map(usize::from),
            None => Some(0),
        }
    }

    /// The local subroutines of a Font DICT, if there are any.
    pub(crate) fn local_subrs(&self, fd: usize) -> Option<&Index> {
        self.font_dicts.get(fd)?.private.as_ref()?.subrs.as_ref()
    }

    /// The glyph that a `seac` component with the Standard Encoding `code`
    /// refers to. CID-keyed fonts have no glyph names and never match.
    pub(crate) fn seac_glyph(&self, data: &[u8], code: u8) -> Option<u16> {
        if self.is_cid() {
            return None;
        }

        let sid = standard_code_sid(code)?;
        let gid = match &self.charset {
            // ISOAdobe maps glyph `n` to SID `n`, up to zcaron.
            Charset::Predefined(0) if sid.0 <= 228 => sid.0,
            Charset::Predefined(_) => return None,
            Charset::Custom(range) => charset_glyph(data.get(range.clone())?, sid)?,
        };

        (usize::from(gid) < self.glyph_count()).then_some(gid)
    }
}

/// The operands of a `ROS` key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ros {
    pub registry: StringId,
    pub ordering: StringId,
    pub supplement: i32,
}

/// A Font DICT and the Private DICT it points to.
#[derive(Clone, Debug)]
pub(crate) struct FdRecord {
    /// The DICT data inside the FDArray. `None` for fonts that are not CID-keyed.
    pub dict: Option<Range<usize>>,
    pub private: Option<PrivateDict>,
}

#[derive(Clone, Debug)]
pub(crate) struct PrivateDict {
    pub entries: Vec<DictEntry>,
    /// The local subroutines, resolved relative to the start of the DICT.
    pub subrs: Option<Index>,
}

/// A parsed FDSelect, expanded to one Font DICT index per glyph.
#[derive(Clone, Debug)]
pub(crate) struct FdSelect {
    /// The encoded FDSelect in the font data.
    pub range: Range<usize>,
    pub fds: Vec<u8>,
}

/// Adobe Technical Note #5176, Table 22.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Charset {
    /// One of the predefined charsets ISOAdobe (0), Expert (1) or ExpertSubset (2).
    Predefined(usize),
    Custom(Range<usize>),
}

/// Parse the font whose Top DICT is stored at `top_dict`.
pub(crate) fn parse_font(
    data: &[u8],
    name_range: Range<usize>,
    top_dict: Range<usize>,
) -> Result<Font> {
    let name = data.get(name_range.clone()).ok_or(Error::MalformedIndex)?;
    let name = String::from_utf8_lossy(name).into_owned();

    let mut ros = None;
    let mut charstring_type = 2;
    let mut char_strings = None;
    let mut charset = 0;
    let mut private = None;
    let mut fd_array = None;
    let mut fd_select = None;

    for entry in parse_dict(data, top_dict.clone())? {
        match entry.operator {
            op::ROS => {
                ros = Some(Ros {
                    registry: sid(&entry, 0)?,
                    ordering: sid(&entry, 1)?,
                    supplement: entry.int(2)?,
                })
            }
            op::CHARSTRING_TYPE => charstring_type = entry.int(0)?,
            op::CHAR_STRINGS => char_strings = Some(entry.offset()?),
            op::CHARSET => charset = entry.offset()?,
            op::PRIVATE => private = Some(entry.size_and_offset()?),
            op::FD_ARRAY => fd_array = Some(entry.offset()?),
            op::FD_SELECT => fd_select = Some(entry.offset()?),
            _ => {}
        }
    }

    if !matches!(charstring_type, 1 | 2) {
        return Err(Error::MalformedFont);
    }

    let char_strings = read_index(data, char_strings.ok_or(Error::MalformedFont)?)?;
    let glyph_count = char_strings.len();
    if glyph_count == 0 {
        return Err(Error::MalformedFont);
    }

    let charset = match charset {
        id @ 0..=2 => Charset::Predefined(id),
        offset => Charset::Custom(offset..offset + charset_len(data, offset, glyph_count)?),
    };

    let (font_dicts, fd_select) = if ros.is_some() {
        let (Some(fd_array), Some(fd_select)) = (fd_array, fd_select) else {
            return Err(Error::MalformedFont);
        };

        let font_dicts = parse_fd_array(data, fd_array)?;
        let fd_select = parse_fd_select(data, fd_select, glyph_count, font_dicts.len())?;
        (font_dicts, Some(fd_select))
    } else {
        let private = private.map(|range| parse_private_dict(data, range)).transpose()?;
        (vec![FdRecord { dict: None, private }], None)
    };

    Ok(Font {
        name,
        name_range,
        top_dict,
        ros,
        charstring_type,
        char_strings,
        charset,
        font_dicts,
        fd_select,
    })
}

fn sid(entry: &DictEntry, index: usize) -> Result<StringId> {
    u16::try_from(entry.int(index)?)
        .map(StringId)
        .map_err(|_| Error::MalformedDict)
}

fn parse_fd_array(data: &[u8], offset: usize) -> Result<Vec<FdRecord>> {
    let index = read_index(data, offset)?;
    if index.is_empty() {
        return Err(Error::MalformedFont);
    }

    let mut font_dicts = Vec::with_capacity(index.len());
    for i in 0..index.len() {
        let range = index.range(i).ok_or(Error::MalformedIndex)?;
        let mut private = None;
        for entry in parse_dict(data, range.clone())? {
            if entry.operator == op::PRIVATE {
                private = Some(parse_private_dict(data, entry.size_and_offset()?)?);
            }
        }

        font_dicts.push(FdRecord { dict: Some(range), private });
    }

    Ok(font_dicts)
}

fn parse_private_dict(data: &[u8], range: Range<usize>) -> Result<PrivateDict> {
    let entries = parse_dict(data, range.clone())?;

    let mut subrs = None;
    if let Some(entry) = entries.iter().find(|e| e.operator == op::SUBRS) {
        // The offset is relative to the start of the Private DICT.
        let offset = range.start.checked_add(entry.offset()?).ok_or(Error::MalformedDict)?;
        subrs = Some(read_index(data, offset)?);
    }

    Ok(PrivateDict { entries, subrs })
}

/// The number of bytes a custom charset takes up.
fn charset_len(data: &[u8], offset: usize, glyph_count: usize) -> Result<usize> {
    let mut r = Reader::new_at(data, offset);
    // .notdef is not part of the charset.
    let covered = glyph_count - 1;

    match r.read::<u8>()? {
        0 => {
            r.skip_bytes(2 * covered)?;
        }
        1 => {
            let mut seen = 0;
            while seen < covered {
                r.read::<u16>()?;
                seen += 1 + usize::from(r.read::<u8>()?);
            }
        }
        2 => {
            let mut seen = 0;
            while seen < covered {
                r.read::<u16>()?;
                seen += 1 + usize::from(r.read::<u16>()?);
            }
        }
        _ => return Err(Error::MalformedFont),
    }

    Ok(r.offset() - offset)
}

/// Look up the glyph of `sid` in an encoded custom charset.
fn charset_glyph(charset: &[u8], sid: StringId) -> Option<u16> {
    let mut r = Reader::new(charset);
    let format = r.read::<u8>().ok()?;
    // .notdef is not part of the charset.
    let mut gid = 1u16;

    while !r.at_end() {
        let first = r.read::<u16>().ok()?;
        let left = match format {
            0 => 0,
            1 => u16::from(r.read::<u8>().ok()?),
            2 => r.read::<u16>().ok()?,
            _ => return None,
        };

        if sid.0 >= first && sid.0 - first <= left {
            return gid.checked_add(sid.0 - first);
        }

        gid = gid.checked_add(left)?.checked_add(1)?;
    }

    None
}

fn parse_fd_select(
    data: &[u8],
    offset: usize,
    glyph_count: usize,
    fd_count: usize,
) -> Result<FdSelect> {
    let mut r = Reader::new_at(data, offset);

    let fds = match r.read::<u8>()? {
        0 => r.read_bytes(glyph_count)?.to_vec(),
        3 => {
            let ranges = r.read::<u16>()?;
            let mut first = r.read::<u16>()?;
            if ranges == 0 || first != 0 {
                return Err(Error::MalformedFont);
            }

            let mut fds = Vec::with_capacity(glyph_count);
            for _ in 0..ranges {
                let fd = r.read::<u8>()?;
                let next = r.read::<u16>()?;
                if next <= first {
                    return Err(Error::MalformedFont);
                }

                fds.extend(std::iter::repeat(fd).take(usize::from(next - first)));
                first = next;
            }

            if fds.len() < glyph_count {
                return Err(Error::MalformedFont);
            }

            fds.truncate(glyph_count);
            fds
        }
        _ => return Err(Error::MalformedFont),
    };

    if fds.iter().any(|&fd| usize::from(fd) >= fd_count) {
        return Err(Error::MalformedFont);
    }

    Ok(FdSelect { range: offset..r.offset(), fds })
}
