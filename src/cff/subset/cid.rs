//! Everything a CID-keyed font has that a name-keyed one lacks.
//!
//! CID-keyed sources are copied, name-keyed ones get a minimal wrapper: one
//! Font DICT that all glyphs map to and an identity charset.

use std::borrow::Cow;

use crate::cff::assembler::{items_size, Item};
use crate::cff::dict::{operators as op, parse_dict};
use crate::cff::font::{Charset, Font};
use crate::cff::index::{create_index, index_byte_span, index_header, Index};
use crate::cff::strings::StringId;
use crate::cff::subset::{copy, Layout};
use crate::{Error, Result};

/// The strings that are appended to the String INDEX of a name-keyed font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CidWrapper {
    pub registry: StringId,
    pub ordering: StringId,
    pub font_name: StringId,
}

impl CidWrapper {
    /// Allocate the SIDs behind the `string_count` existing custom strings.
    pub fn new(string_count: usize) -> Result<Self> {
        let sid = |n: usize| {
            string_count
                .checked_add(n)
                .and_then(StringId::from_custom_index)
                .ok_or(Error::SubsetError)
        };

        Ok(Self { registry: sid(0)?, ordering: sid(1)?, font_name: sid(2)? })
    }
}

/// The String INDEX, with the wrapper's strings appended if there is one.
pub(crate) fn build_strings<'a>(
    data: &'a [u8],
    strings: &Index,
    font: &Font,
    wrapper: Option<&CidWrapper>,
) -> Result<Item<'a>> {
    if wrapper.is_none() {
        let start = strings.span().start;
        return copy(data, start..start + index_byte_span(data, start)?);
    }

    let mut objects: Vec<Cow<[u8]>> = Vec::with_capacity(strings.len() + 3);
    for i in 0..strings.len() {
        objects.push(strings.get(data, i).ok_or(Error::TruncatedInput)?.into());
    }

    objects.push(Cow::Borrowed(&b"Adobe"[..]));
    objects.push(Cow::Borrowed(&b"Identity"[..]));
    let name = data.get(font.name_range.clone()).ok_or(Error::TruncatedInput)?;
    objects.push([name, &b"-OneRange"[..]].concat().into());

    Ok(Item::Bytes(create_index(&objects)?.into()))
}

/// The FDSelect, mapping every glyph of a name-keyed font to Font DICT 0.
pub(crate) fn build_fd_select<'a>(data: &'a [u8], font: &Font) -> Result<Vec<Item<'a>>> {
    if let Some(fd_select) = &font.fd_select {
        return Ok(vec![copy(data, fd_select.range.clone())?]);
    }

    let glyph_count = u32::try_from(font.glyph_count()).map_err(|_| Error::SubsetError)?;

    Ok(vec![
        // Format 3 with a single range.
        Item::Int { value: 3, size: 1 },
        Item::Int { value: 1, size: 2 },
        Item::Int { value: 0, size: 2 },
        Item::Int { value: 0, size: 1 },
        // Sentinel
        Item::Int { value: glyph_count, size: 2 },
    ])
}

/// The charset. Custom charsets of CID-keyed fonts are kept, everything else
/// maps glyph `n` to CID `n`.
pub(crate) fn build_charset<'a>(data: &'a [u8], font: &Font) -> Result<Vec<Item<'a>>> {
    match (font.is_cid(), &font.charset) {
        (true, Charset::Custom(range)) => return Ok(vec![copy(data, range.clone())?]),
        (true, Charset::Predefined(id)) => {
            log::debug!("{} has predefined charset {id}, using identity instead", font.name)
        }
        (false, _) => {}
    }

    match font.glyph_count() {
        // Only .notdef, which is never part of a charset.
        0 | 1 => Ok(vec![Item::Int { value: 0, size: 1 }]),
        n => {
            let left = u32::try_from(n - 2).map_err(|_| Error::SubsetError)?;
            Ok(vec![
                Item::Int { value: 2, size: 1 },
                Item::Int { value: 1, size: 2 },
                Item::Int { value: left, size: 2 },
            ])
        }
    }
}

/// The FDArray INDEX. Every Font DICT points at the rebuilt Private DICT
/// whose bounds are recorded in `layout`.
pub(crate) fn build_fd_array<'a>(
    data: &'a [u8],
    font: &Font,
    wrapper: Option<&CidWrapper>,
    layout: &Layout,
) -> Result<Vec<Item<'a>>> {
    let mut dicts = Vec::with_capacity(font.font_dicts.len());

    for (record, marks) in font.font_dicts.iter().zip(&layout.font_dicts) {
        let mut items = vec![];

        match (&record.dict, wrapper) {
            (Some(range), _) => {
                for entry in parse_dict(data, range.clone())? {
                    if entry.operator != op::PRIVATE {
                        items.push(copy(data, entry.range)?);
                    }
                }
            }
            (None, Some(wrapper)) => {
                items.push(Item::DictInt(i32::from(wrapper.font_name.0)));
                items.push(Item::Bytes(op::FONT_NAME.to_bytes().into()));
            }
            (None, None) => return Err(Error::SubsetError),
        }

        items.push(Item::Offset { target: marks.private_end, origin: Some(marks.private_start) });
        items.push(Item::Offset { target: marks.private_start, origin: None });
        items.push(Item::Bytes(op::PRIVATE.to_bytes().into()));
        dicts.push(items);
    }

    let lens: Vec<usize> = dicts.iter().map(|items| items_size(items)).collect();
    let mut items = index_header(&lens)?;
    items.extend(dicts.into_iter().flatten());
    Ok(items)
}
