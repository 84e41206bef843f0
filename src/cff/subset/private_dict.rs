use crate::cff::assembler::{Item, Mark};
use crate::cff::dict::operators::SUBRS;
use crate::cff::font::PrivateDict;
use crate::cff::subset::copy;
use crate::Result;

/// Rewrite a Private DICT that starts at `start` in the new file.
///
/// Every key is copied, except for `Subrs`, which is pointed at `subrs` instead.
pub(crate) fn build_private_dict<'a>(
    data: &'a [u8],
    private: Option<&PrivateDict>,
    start: Mark,
    subrs: Option<Mark>,
) -> Result<Vec<Item<'a>>> {
    let mut items = vec![];

    for entry in private.map(|p| p.entries.as_slice()).unwrap_or_default() {
        if entry.operator != SUBRS {
            items.push(copy(data, entry.range.clone())?);
        }
    }

    if let Some(subrs) = subrs {
        // Relative to the start of the Private DICT.
        items.push(Item::Offset { target: subrs, origin: Some(start) });
        items.push(Item::Bytes(SUBRS.to_bytes().into()));
    }

    Ok(items)
}
