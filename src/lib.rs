/*!
Reduces CFF fonts to the glyphs a document actually uses.

The subset is always a standalone, CID-keyed CFF file, which is what PDF
expects for fonts that are addressed with 2-byte glyph IDs (`Identity-H`).
Name-keyed fonts are converted on the fly.

# Example
In the example below, we keep only the glyphs with IDs 68, 69 and 70 of the
font `MyFont-Regular`.

```no_run
use cff_subsetter::open;

# fn main() -> Result<(), Box<dyn std::error::Error>> {
// Read the raw CFF data, e.g. the `CFF ` table of an OpenType font.
let data = std::fs::read("fonts/MyFont-Regular.cff")?;
let set = open(&data)?;

let sub = set.subset("MyFont-Regular", &[68, 69, 70])?;
std::fs::write("target/MyFont-Small.cff", sub)?;
# Ok(())
# }
```

Notably, this subsetter does not really remove glyphs, just their outlines.
Unused glyphs and subroutines are replaced by single-byte placeholders, so
glyph IDs and subroutine numbers stay valid and charstrings can be copied
without being rewritten.
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod cff;
mod stream;

pub use crate::cff::{open, Font, FontSet, SubsetOptions};

use std::fmt::{self, Display, Formatter};

/// A result type with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Parsing or subsetting failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Parsing expected more data.
    TruncatedInput,
    /// The font set has no font with the requested name.
    UnknownFont,
    /// An INDEX has an invalid offset size or decreasing offsets.
    MalformedIndex,
    /// A DICT has invalid operands.
    MalformedDict,
    /// The font structure is inconsistent, e.g. a required key is missing,
    /// the FDSelect doesn't cover all glyphs or a charstring overflows the
    /// operand stack.
    MalformedFont,
    /// An error occurred while assembling the subset.
    ///
    /// This indicates a bug in the subsetter rather than a problem with the
    /// font.
    SubsetError,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::TruncatedInput => f.pad("missing more data"),
            Self::UnknownFont => f.pad("no font with this name"),
            Self::MalformedIndex => f.pad("malformed index"),
            Self::MalformedDict => f.pad("malformed dict"),
            Self::MalformedFont => f.pad("malformed font"),
            Self::SubsetError => f.pad("subsetting failed"),
        }
    }
}

impl std::error::Error for Error {}
