mod argstack;
mod assembler;
mod charstring;
mod dict;
mod encoding;
mod font;
mod index;
mod number;
mod operator;
mod strings;
mod subset;

pub use self::font::Font;

use self::font::parse_font;
use self::index::{read_index, Index};
use self::strings::StringId;
use crate::stream::Reader;
use crate::{Error, Result};

/// Options that control how a font is subsetted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetOptions {
    /// Whether to always keep glyph 0, even if it wasn't requested.
    pub include_notdef: bool,
    /// How deep subroutine calls are followed. Subroutines below this level
    /// are kept, but not looked into.
    pub max_subroutine_depth: u8,
}

impl Default for SubsetOptions {
    fn default() -> Self {
        // Type 2 charstrings allow at most 10 levels of nesting.
        Self { include_notdef: true, max_subroutine_depth: 10 }
    }
}

/// The fonts of a CFF file.
///
/// Opening a font set resolves all offsets of all of its fonts, so subsetting
/// afterwards only fails for internal reasons or broken charstrings.
#[derive(Debug, Clone)]
pub struct FontSet<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) header_size: usize,
    pub(crate) strings: Index,
    pub(crate) global_subrs: Index,
    fonts: Vec<Font>,
}

/// Parse the CFF data in `data`.
///
/// The data has to start with the CFF header. For OpenType fonts, this is
/// the contents of the `CFF ` table.
pub fn open(data: &[u8]) -> Result<FontSet<'_>> {
    let mut r = Reader::new(data);
    let major = r.read::<u8>()?;
    let _minor = r.read::<u8>()?;
    let header_size = usize::from(r.read::<u8>()?);
    let _absolute_offset_size = r.read::<u8>()?;

    if major != 1 || header_size < 4 {
        return Err(Error::MalformedFont);
    }

    // The four INDEXes follow each other directly.
    let names = read_index(data, header_size)?;
    let top_dicts = read_index(data, names.span().end)?;
    let strings = read_index(data, top_dicts.span().end)?;
    let global_subrs = read_index(data, strings.span().end)?;

    if names.len() != top_dicts.len() {
        return Err(Error::MalformedIndex);
    }

    let mut fonts = Vec::with_capacity(names.len());
    for i in 0..names.len() {
        let name = names.range(i).ok_or(Error::MalformedIndex)?;
        if data.get(name.clone()).and_then(<[u8]>::first) == Some(&0) {
            log::debug!("skipping deleted font {i}");
            continue;
        }

        let top_dict = top_dicts.range(i).ok_or(Error::MalformedIndex)?;
        let font = parse_font(data, name, top_dict)?;

        log::debug!(
            "parsed font {} (cid: {}, glyphs: {}, font dicts: {})",
            font.name(),
            font.is_cid(),
            font.glyph_count(),
            font.font_dict_count(),
        );

        fonts.push(font);
    }

    Ok(FontSet { data, header_size, strings, global_subrs, fonts })
}

impl<'a> FontSet<'a> {
    /// The names of all fonts, in file order. Deleted fonts are left out.
    pub fn font_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fonts.iter().map(Font::name)
    }

    /// The font with the given name.
    pub fn font(&self, name: &str) -> Option<&Font> {
        self.fonts.iter().find(|font| font.name == name)
    }

    /// Whether the font with the given name is CID-keyed, or `None` if there
    /// is no such font.
    pub fn is_cid(&self, name: &str) -> Option<bool> {
        self.font(name).map(Font::is_cid)
    }

    /// Resolve a string identifier.
    pub fn string(&self, sid: u16) -> Option<&'a str> {
        let sid = StringId(sid);
        match sid.custom_index() {
            None => sid.standard_string(),
            Some(index) => std::str::from_utf8(self.strings.get(self.data, index)?).ok(),
        }
    }

    /// The registry, ordering and supplement of a CID-keyed font.
    pub fn cid_system_info(&self, name: &str) -> Option<(&'a str, &'a str, i32)> {
        let ros = self.font(name)?.ros?;
        Some((self.string(ros.registry.0)?, self.string(ros.ordering.0)?, ros.supplement))
    }

    /// Subset the font with the given name to `glyphs`, using the default
    /// options.
    ///
    /// See [`FontSet::subset_with`].
    pub fn subset(&self, name: &str, glyphs: &[u16]) -> Result<Vec<u8>> {
        self.subset_with(name, glyphs, &SubsetOptions::default())
    }

    /// Subset the font with the given name to `glyphs`.
    ///
    /// The result is a standalone CFF file holding a single CID-keyed font.
    /// Glyph IDs are preserved: the outlines of glyphs that are not kept are
    /// replaced by empty ones. Name-keyed fonts are converted to CID-keyed
    /// ones with an identity charset.
    pub fn subset_with(
        &self,
        name: &str,
        glyphs: &[u16],
        options: &SubsetOptions,
    ) -> Result<Vec<u8>> {
        let font = self.font(name).ok_or(Error::UnknownFont)?;
        subset::subset(self, font, glyphs, options)
    }
}
