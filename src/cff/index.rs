use std::ops::Range;

use rustc_hash::FxHashSet;

use crate::cff::assembler::{Assembler, Item};
use crate::stream::Reader;
use crate::{Error, Result};

/// An INDEX inside the font data.
///
/// Offsets are absolute positions in the font data, so object `i` spans
/// `offsets[i]..offsets[i + 1]`. An INDEX without objects has no offsets at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    start: usize,
    end: usize,
    offsets: Vec<usize>,
}

impl Index {
    /// The number of objects.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Whether the INDEX has no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte range of the object at `index`.
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index.checked_add(1)?)?;
        Some(start..end)
    }

    /// The data of the object at `index`.
    pub fn get<'a>(&self, data: &'a [u8], index: usize) -> Option<&'a [u8]> {
        data.get(self.range(index)?)
    }

    /// The byte range of the whole INDEX, header included.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Read the INDEX that starts at `start`.
pub(crate) fn read_index(data: &[u8], start: usize) -> Result<Index> {
    let mut r = Reader::new_at(data, start);
    let count = usize::from(r.read::<u16>()?);
    if count == 0 {
        return Ok(Index { start, end: r.offset(), offsets: vec![] });
    }

    let offset_size = r.read::<u8>()?;
    if !(1..=4).contains(&offset_size) {
        return Err(Error::MalformedIndex);
    }

    // Offsets are relative to the byte preceding the object data.
    let base = start + 2 + 1 + (count + 1) * usize::from(offset_size) - 1;

    let mut offsets = Vec::with_capacity(count + 1);
    for _ in 0..=count {
        let offset = r.read_offset(offset_size)? as usize;
        if offset == 0 || offsets.last().is_some_and(|&last| base + offset < last) {
            return Err(Error::MalformedIndex);
        }

        offsets.push(base + offset);
    }

    let end = offsets[count];
    if end > data.len() {
        return Err(Error::TruncatedInput);
    }

    Ok(Index { start, end, offsets })
}

/// The number of bytes taken up by the INDEX that starts at `start`.
///
/// Only looks at the header and the last offset, which is enough to copy an
/// INDEX without decoding it.
pub(crate) fn index_byte_span(data: &[u8], start: usize) -> Result<usize> {
    let mut r = Reader::new_at(data, start);
    let count = usize::from(r.read::<u16>()?);
    if count == 0 {
        return Ok(2);
    }

    let offset_size = r.read::<u8>()?;
    let header = 2 + 1 + (count + 1) * usize::from(offset_size);
    r.jump(start + header - usize::from(offset_size));
    let last = r.read_offset(offset_size)? as usize;
    if last == 0 {
        return Err(Error::MalformedIndex);
    }

    Ok(header + last - 1)
}

/// Build a new INDEX with the same number of objects as `index`, keeping only
/// the objects in `used`.
///
/// Unused objects are replaced by the single byte `filler`, which keeps the
/// object numbering intact.
pub(crate) fn build_pruned_index(
    data: &[u8],
    index: &Index,
    used: &FxHashSet<u32>,
    filler: u8,
) -> Result<Vec<u8>> {
    let filler = [filler];
    let mut objects = Vec::with_capacity(index.len());

    for i in 0..index.len() {
        let keep = u32::try_from(i).is_ok_and(|i| used.contains(&i));
        let object = match index.get(data, i) {
            Some(object) if keep && !object.is_empty() => object,
            Some(_) => &filler[..],
            None => return Err(Error::TruncatedInput),
        };
        objects.push(object);
    }

    create_index(&objects)
}

/// Assemble an INDEX from its objects, using the smallest offset size that fits.
pub(crate) fn create_index<T: AsRef<[u8]>>(objects: &[T]) -> Result<Vec<u8>> {
    let lens: Vec<usize> = objects.iter().map(|o| o.as_ref().len()).collect();
    let mut asm = Assembler::new();
    asm.extend(index_header(&lens)?);
    for object in objects {
        asm.bytes(object.as_ref());
    }

    asm.build()
}

/// The count, offset size and offsets of an INDEX whose objects have the
/// given lengths. The object data has to follow directly.
pub(crate) fn index_header<'a>(lens: &[usize]) -> Result<Vec<Item<'a>>> {
    let count = u16::try_from(lens.len()).map_err(|_| Error::SubsetError)?;

    let mut items = Vec::with_capacity(lens.len() + 3);
    items.push(Item::Int { value: u32::from(count), size: 2 });
    if count == 0 {
        return Ok(items);
    }

    let data_len: usize = lens.iter().sum();
    let last_offset = u32::try_from(data_len + 1).map_err(|_| Error::SubsetError)?;
    let size = offset_size(last_offset);
    items.push(Item::Int { value: u32::from(size), size: 1 });

    let mut offset = 1;
    items.push(Item::Int { value: offset, size });
    for &len in lens {
        // Cannot overflow, the sum fits into `last_offset`.
        offset += len as u32;
        items.push(Item::Int { value: offset, size });
    }

    Ok(items)
}

/// The number of bytes needed to store `max`.
pub(crate) fn offset_size(max: u32) -> u8 {
    match max {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}
