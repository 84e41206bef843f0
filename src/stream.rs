use crate::{Error, Result};

/// A readable stream of binary data.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    /// The underlying data of the reader.
    data: &'a [u8],
    /// The current offset in bytes. Is not guaranteed to be in range.
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a new readable stream of binary data.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a new readable stream of binary data at a specific position.
    #[inline]
    pub fn new_at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// Returns the current offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Jump to a specific location.
    #[inline]
    pub fn jump(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Check whether the reader is at the end of the buffer.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Try to read `T` from the data.
    #[inline]
    pub fn read<T: Readable<'a>>(&mut self) -> Result<T> {
        T::read(self).ok_or(Error::TruncatedInput)
    }

    /// Try to read `T` from the data without advancing.
    #[inline]
    pub fn peek<T: Readable<'a>>(&self) -> Result<T> {
        let mut r = self.clone();
        r.read::<T>()
    }

    /// Read a certain number of bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len).ok_or(Error::TruncatedInput)
    }

    /// Skip the next `n` bytes from the stream.
    #[inline]
    pub fn skip_bytes(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Read a big-endian unsigned integer that is `size` bytes wide.
    ///
    /// Used for INDEX offset arrays, whose width is only known at runtime.
    pub fn read_offset(&mut self, size: u8) -> Result<u32> {
        match size {
            1 => self.read::<u8>().map(u32::from),
            2 => self.read::<u16>().map(u32::from),
            3 => self.read::<U24>().map(|n| n.0),
            4 => self.read::<u32>(),
            _ => Err(Error::MalformedIndex),
        }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let v = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(v)
    }
}

/// Trait for an object that can be read from a byte stream.
pub(crate) trait Readable<'a>: Sized {
    fn read(r: &mut Reader<'a>) -> Option<Self>;
}

impl<const N: usize> Readable<'_> for [u8; N] {
    fn read(r: &mut Reader) -> Option<Self> {
        r.take(N)?.try_into().ok()
    }
}

impl Readable<'_> for u8 {
    fn read(r: &mut Reader) -> Option<Self> {
        r.take(1).map(|b| b[0])
    }
}

impl Readable<'_> for u16 {
    fn read(r: &mut Reader) -> Option<Self> {
        <[u8; 2]>::read(r).map(Self::from_be_bytes)
    }
}

impl Readable<'_> for i16 {
    fn read(r: &mut Reader) -> Option<Self> {
        <[u8; 2]>::read(r).map(Self::from_be_bytes)
    }
}

impl Readable<'_> for u32 {
    fn read(r: &mut Reader) -> Option<Self> {
        <[u8; 4]>::read(r).map(Self::from_be_bytes)
    }
}

impl Readable<'_> for i32 {
    fn read(r: &mut Reader) -> Option<Self> {
        <[u8; 4]>::read(r).map(Self::from_be_bytes)
    }
}

/// A 24-bit unsigned integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct U24(pub u32);

impl U24 {
    pub const MAX: u32 = 0xFF_FFFF;
}

impl Readable<'_> for U24 {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let data = <[u8; 3]>::read(r)?;
        Some(U24(u32::from_be_bytes([0, data[0], data[1], data[2]])))
    }
}

/// A writable stream of binary data.
pub(crate) struct Writer(Vec<u8>);

impl Writer {
    /// Create a new writable stream of binary data with a capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Write `T` into the data.
    #[inline]
    pub fn write<T: Writeable>(&mut self, data: T) {
        data.write(self);
    }

    /// Give bytes into the writer.
    #[inline]
    pub fn extend(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Write the lowest `size` bytes of `value` in big-endian order.
    ///
    /// Fails if `value` does not fit.
    pub fn write_sized(&mut self, value: u32, size: u8) -> Result<()> {
        match size {
            1 => self.write(u8::try_from(value).map_err(|_| Error::SubsetError)?),
            2 => self.write(u16::try_from(value).map_err(|_| Error::SubsetError)?),
            3 if value <= U24::MAX => self.write(U24(value)),
            4 => self.write(value),
            _ => return Err(Error::SubsetError),
        }

        Ok(())
    }

    /// The number of written bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return the written bytes.
    #[inline]
    pub fn finish(self) -> Vec<u8> {
        self.0
    }
}

/// Trait for an object that can be written into a byte stream.
pub(crate) trait Writeable: Sized {
    fn write(&self, w: &mut Writer);
}

impl<const N: usize> Writeable for [u8; N] {
    fn write(&self, w: &mut Writer) {
        w.extend(self);
    }
}

impl Writeable for &[u8] {
    fn write(&self, w: &mut Writer) {
        w.extend(self);
    }
}

impl Writeable for u8 {
    fn write(&self, w: &mut Writer) {
        w.extend(&[*self]);
    }
}

impl Writeable for u16 {
    fn write(&self, w: &mut Writer) {
        w.write::<[u8; 2]>(self.to_be_bytes());
    }
}

impl Writeable for u32 {
    fn write(&self, w: &mut Writer) {
        w.write::<[u8; 4]>(self.to_be_bytes());
    }
}

impl Writeable for i32 {
    fn write(&self, w: &mut Writer) {
        w.write::<[u8; 4]>(self.to_be_bytes());
    }
}

impl Writeable for U24 {
    fn write(&self, w: &mut Writer) {
        let data = self.0.to_be_bytes();
        w.write::<[u8; 3]>([data[1], data[2], data[3]]);
    }
}
