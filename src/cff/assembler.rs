//! Lays out a new CFF file whose internal offsets are only known once
//! everything before them has been sized.
//!
//! The file is described as a flat list of [`Item`]s. Offsets are expressed as
//! the distance between two [`Mark`]s, and resolved in [`Assembler::build`]:
//! first every item is sized, then the offsets are fixed up and finally the
//! bytes are written.

use std::borrow::Cow;

use crate::cff::number::{write_dict_int, DICT_INT_SIZE};
use crate::stream::Writer;
use crate::{Error, Result};

/// A position in the output that is only known after layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Mark(usize);

/// One piece of the output file.
#[derive(Clone, Debug)]
pub(crate) enum Item<'a> {
    /// Bytes that are copied verbatim, either from the source font or from
    /// an intermediate buffer.
    Bytes(Cow<'a, [u8]>),
    /// A big-endian unsigned integer that is `size` bytes wide.
    Int { value: u32, size: u8 },
    /// An integer DICT operand.
    DictInt(i32),
    /// An integer DICT operand holding the distance from `origin` (or the
    /// start of the file) to `target`.
    Offset { target: Mark, origin: Option<Mark> },
    /// Takes up no space, but records its position.
    Mark(Mark),
}

impl Item<'_> {
    /// The number of bytes the item takes up in the output.
    pub fn size(&self) -> usize {
        match self {
            Item::Bytes(bytes) => bytes.len(),
            Item::Int { size, .. } => usize::from(*size),
            Item::DictInt(_) | Item::Offset { .. } => DICT_INT_SIZE,
            Item::Mark(_) => 0,
        }
    }
}

/// The sum of the sizes of `items`.
pub(crate) fn items_size(items: &[Item]) -> usize {
    items.iter().map(Item::size).sum()
}

/// An ordered list of items making up a file.
#[derive(Default)]
pub(crate) struct Assembler<'a> {
    items: Vec<Item<'a>>,
    marks: usize,
}

impl<'a> Assembler<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new mark. It still needs to be placed with [`Item::Mark`].
    pub fn mark(&mut self) -> Mark {
        self.marks += 1;
        Mark(self.marks - 1)
    }

    /// Append an item.
    pub fn push(&mut self, item: Item<'a>) {
        self.items.push(item);
    }

    /// Append several items.
    pub fn extend(&mut self, items: impl IntoIterator<Item = Item<'a>>) {
        self.items.extend(items);
    }

    /// Append bytes that are copied verbatim.
    pub fn bytes(&mut self, bytes: impl Into<Cow<'a, [u8]>>) {
        self.push(Item::Bytes(bytes.into()));
    }

    /// Lay out all items and write the file.
    pub fn build(self) -> Result<Vec<u8>> {
        // Size pass: find the position of every mark.
        let mut positions = vec![None; self.marks];
        let mut total = 0;
        for item in &self.items {
            if let Item::Mark(mark) = item {
                let slot = positions.get_mut(mark.0).ok_or(Error::SubsetError)?;
                if slot.replace(total).is_some() {
                    return Err(Error::SubsetError);
                }
            }
            total += item.size();
        }

        // Fix-up pass: resolve the offsets.
        let position = |mark: Mark| -> Result<usize> {
            positions.get(mark.0).copied().flatten().ok_or(Error::SubsetError)
        };

        let mut offsets = Vec::new();
        for item in &self.items {
            if let Item::Offset { target, origin } = *item {
                let origin = origin.map(position).transpose()?.unwrap_or(0);
                let distance = position(target)?
                    .checked_sub(origin)
                    .and_then(|d| i32::try_from(d).ok())
                    .ok_or(Error::SubsetError)?;
                offsets.push(distance);
            }
        }

        // Emit pass.
        let mut w = Writer::with_capacity(total);
        let mut offsets = offsets.into_iter();
        for item in &self.items {
            match item {
                Item::Bytes(bytes) => w.extend(bytes),
                Item::Int { value, size } => w.write_sized(*value, *size)?,
                Item::DictInt(n) => write_dict_int(&mut w, *n),
                Item::Offset { .. } => {
                    let distance = offsets.next().ok_or(Error::SubsetError)?;
                    write_dict_int(&mut w, distance);
                }
                Item::Mark(_) => {}
            }
        }

        if w.len() != total {
            return Err(Error::SubsetError);
        }

        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_offsets() {
        let mut asm = Assembler::new();
        let start = asm.mark();
        let end = asm.mark();

        asm.push(Item::Mark(start));
        asm.push(Item::Offset { target: end, origin: None });
        asm.bytes(&b"ab"[..]);
        asm.push(Item::Int { value: 0x0102, size: 2 });
        asm.push(Item::Mark(end));
        asm.push(Item::Offset { target: end, origin: Some(start) });

        assert_eq!(
            asm.build().unwrap(),
            vec![29, 0, 0, 0, 9, b'a', b'b', 1, 2, 29, 0, 0, 0, 9]
        );
    }

    #[test]
    fn relative_offsets() {
        let mut asm = Assembler::new();
        let base = asm.mark();
        let target = asm.mark();

        asm.bytes(vec![0u8; 3]);
        asm.push(Item::Mark(base));
        asm.push(Item::DictInt(-1));
        asm.push(Item::Offset { target, origin: Some(base) });
        asm.push(Item::Mark(target));

        let data = asm.build().unwrap();
        assert_eq!(data.len(), 13);
        assert_eq!(&data[3..8], &[29, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&data[8..], &[29, 0, 0, 0, 10]);
    }

    #[test]
    fn unplaced_mark() {
        let mut asm = Assembler::new();
        let mark = asm.mark();
        asm.push(Item::Offset { target: mark, origin: None });
        assert_eq!(asm.build(), Err(Error::SubsetError));
    }

    #[test]
    fn mark_placed_twice() {
        let mut asm = Assembler::new();
        let mark = asm.mark();
        asm.push(Item::Mark(mark));
        asm.push(Item::Mark(mark));
        assert_eq!(asm.build(), Err(Error::SubsetError));
    }

    #[test]
    fn origin_after_target() {
        let mut asm = Assembler::new();
        let a = asm.mark();
        let b = asm.mark();
        asm.push(Item::Mark(a));
        asm.bytes(vec![0u8; 4]);
        asm.push(Item::Mark(b));
        asm.push(Item::Offset { target: a, origin: Some(b) });
        assert_eq!(asm.build(), Err(Error::SubsetError));
    }

    #[test]
    fn int_that_does_not_fit() {
        let mut asm = Assembler::new();
        asm.push(Item::Int { value: 256, size: 1 });
        assert_eq!(asm.build(), Err(Error::SubsetError));
    }

    #[test]
    fn item_sizes() {
        let items = [
            Item::Bytes(Cow::Borrowed(&[1, 2, 3])),
            Item::Int { value: 0, size: 3 },
            Item::DictInt(7),
            Item::Mark(Mark(0)),
        ];
        assert_eq!(items_size(&items), 11);
    }
}
