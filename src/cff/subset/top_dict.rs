use crate::cff::assembler::Item;
use crate::cff::dict::{operators as op, parse_dict};
use crate::cff::font::Font;
use crate::cff::subset::cid::CidWrapper;
use crate::cff::subset::{copy, Layout};
use crate::{Error, Result};

/// Rewrite the Top DICT of `font` for the subset.
///
/// Keys that point into the font are replaced with offsets into the new file.
/// A name-keyed font additionally gets the keys that make it CID-keyed.
pub(crate) fn build_top_dict<'a>(
    data: &'a [u8],
    font: &Font,
    wrapper: Option<&CidWrapper>,
    layout: &Layout,
) -> Result<Vec<Item<'a>>> {
    let mut items = vec![];

    // ROS has to be the first key of a CID-keyed font.
    if let Some(wrapper) = wrapper {
        items.push(Item::DictInt(i32::from(wrapper.registry.0)));
        items.push(Item::DictInt(i32::from(wrapper.ordering.0)));
        items.push(Item::DictInt(0));
        items.push(Item::Bytes(op::ROS.to_bytes().into()));
    }

    for entry in parse_dict(data, font.top_dict.clone())? {
        match entry.operator {
            op::ENCODING
            | op::PRIVATE
            | op::FD_SELECT
            | op::FD_ARRAY
            | op::CHARSET
            | op::CHAR_STRINGS => {}
            _ => items.push(copy(data, entry.range)?),
        }
    }

    if wrapper.is_some() {
        let count = i32::try_from(font.glyph_count()).map_err(|_| Error::SubsetError)?;
        items.push(Item::DictInt(count));
        items.push(Item::Bytes(op::CID_COUNT.to_bytes().into()));
    }

    for (target, operator) in [
        (layout.fd_array, op::FD_ARRAY),
        (layout.fd_select, op::FD_SELECT),
        (layout.charset, op::CHARSET),
        (layout.char_strings, op::CHAR_STRINGS),
    ] {
        items.push(Item::Offset { target, origin: None });
        items.push(Item::Bytes(operator.to_bytes().into()));
    }

    Ok(items)
}
