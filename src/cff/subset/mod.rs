mod cid;
mod private_dict;
mod top_dict;
mod usage;

use std::ops::Range;

use crate::cff::assembler::{items_size, Assembler, Item, Mark};
use crate::cff::font::Font;
use crate::cff::index::{build_pruned_index, create_index, index_header};
use crate::cff::operator::charstring::{ENDCHAR, RETURN};
use crate::cff::{FontSet, SubsetOptions};
use crate::{Error, Result};

use self::cid::CidWrapper;
use self::private_dict::build_private_dict;
use self::top_dict::build_top_dict;

/// The marks of the structures that DICTs point to.
pub(crate) struct Layout {
    pub fd_array: Mark,
    pub fd_select: Mark,
    pub charset: Mark,
    pub char_strings: Mark,
    /// One entry per Font DICT.
    pub font_dicts: Vec<FdMarks>,
}

/// The marks of one Font DICT's Private DICT and local subroutines.
pub(crate) struct FdMarks {
    pub private_start: Mark,
    pub private_end: Mark,
    /// `None` if the Font DICT has no local subroutines.
    pub subrs: Option<Mark>,
}

impl Layout {
    fn new(asm: &mut Assembler, font: &Font) -> Self {
        let font_dicts = (0..font.font_dict_count())
            .map(|fd| FdMarks {
                private_start: asm.mark(),
                private_end: asm.mark(),
                subrs: font.local_subrs(fd).map(|_| asm.mark()),
            })
            .collect();

        Self {
            fd_array: asm.mark(),
            fd_select: asm.mark(),
            charset: asm.mark(),
            char_strings: asm.mark(),
            font_dicts,
        }
    }
}

/// Copy a range of the font data into the output.
pub(crate) fn copy(data: &[u8], range: Range<usize>) -> Result<Item<'_>> {
    data.get(range).map(|bytes| Item::Bytes(bytes.into())).ok_or(Error::TruncatedInput)
}

/// Subset `font` to `glyphs`, producing a standalone CID-keyed CFF.
pub(crate) fn subset(
    set: &FontSet,
    font: &Font,
    glyphs: &[u16],
    options: &SubsetOptions,
) -> Result<Vec<u8>> {
    let data = set.data;
    let usage = usage::collect(data, &set.global_subrs, font, glyphs, options)?;

    let wrapper = if font.is_cid() { None } else { Some(CidWrapper::new(set.strings.len())?) };

    let mut asm = Assembler::new();
    let layout = Layout::new(&mut asm, font);

    asm.push(copy(data, 0..set.header_size)?);
    let name = data.get(font.name_range.clone()).ok_or(Error::TruncatedInput)?;
    asm.bytes(create_index(&[name])?);

    let top_dict = build_top_dict(data, font, wrapper.as_ref(), &layout)?;
    asm.extend(index_header(&[items_size(&top_dict)])?);
    asm.extend(top_dict);

    asm.push(cid::build_strings(data, &set.strings, font, wrapper.as_ref())?);
    asm.bytes(build_pruned_index(data, &set.global_subrs, &usage.global_subrs, RETURN)?);

    asm.push(Item::Mark(layout.fd_select));
    asm.extend(cid::build_fd_select(data, font)?);
    asm.push(Item::Mark(layout.charset));
    asm.extend(cid::build_charset(data, font)?);
    asm.push(Item::Mark(layout.fd_array));
    asm.extend(cid::build_fd_array(data, font, wrapper.as_ref(), &layout)?);

    for (record, marks) in font.font_dicts.iter().zip(&layout.font_dicts) {
        asm.push(Item::Mark(marks.private_start));
        asm.extend(build_private_dict(
            data,
            record.private.as_ref(),
            marks.private_start,
            marks.subrs,
        )?);
        asm.push(Item::Mark(marks.private_end));
    }

    let mut kept_local = 0;
    for (fd, marks) in layout.font_dicts.iter().enumerate() {
        let (Some(mark), Some(subrs)) = (marks.subrs, font.local_subrs(fd)) else {
            continue;
        };

        let used = usage.local_subrs.get(fd).ok_or(Error::SubsetError)?;
        kept_local += used.len();
        asm.push(Item::Mark(mark));
        asm.bytes(build_pruned_index(data, subrs, used, RETURN)?);
    }

    asm.push(Item::Mark(layout.char_strings));
    asm.bytes(build_pruned_index(data, &font.char_strings, &usage.glyphs, ENDCHAR)?);

    let out = asm.build()?;

    log::debug!(
        "subset {}: kept {} of {} glyphs, {} global and {} local subroutines, {} bytes",
        font.name,
        usage.glyphs.len(),
        font.glyph_count(),
        usage.global_subrs.len(),
        kept_local,
        out.len(),
    );

    Ok(out)
}
