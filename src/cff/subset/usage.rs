use rustc_hash::FxHashSet;

use crate::cff::charstring::{Scanner, Subroutines};
use crate::cff::font::Font;
use crate::cff::index::Index;
use crate::cff::SubsetOptions;
use crate::{Error, Result};

/// Everything a subset keeps of a font.
#[derive(Debug, Default)]
pub(crate) struct Usage {
    pub glyphs: FxHashSet<u32>,
    pub global_subrs: FxHashSet<u32>,
    /// One set per Font DICT.
    pub local_subrs: Vec<FxHashSet<u32>>,
}

/// Find the glyphs and subroutines that need to be kept to render `glyphs`.
pub(crate) fn collect(
    data: &[u8],
    global_subrs: &Index,
    font: &Font,
    glyphs: &[u16],
    options: &SubsetOptions,
) -> Result<Usage> {
    let mut usage = Usage {
        local_subrs: vec![FxHashSet::default(); font.font_dict_count()],
        ..Usage::default()
    };

    if options.include_notdef {
        usage.glyphs.insert(0);
    }

    for &gid in glyphs {
        if usize::from(gid) < font.glyph_count() {
            usage.glyphs.insert(u32::from(gid));
        } else {
            log::warn!(
                "ignoring glyph {gid}, {} only has {} glyphs",
                font.name(),
                font.glyph_count()
            );
        }
    }

    let charstring_type = font.charstring_type();
    let global = Subroutines::new(global_subrs, charstring_type);

    // Accented glyphs pull in their components, which are scanned in turn.
    let mut queue: Vec<u32> = usage.glyphs.iter().copied().collect();
    while let Some(gid) = queue.pop() {
        // Glyphs were filtered above, so they all fit into a u16.
        let gid = u16::try_from(gid).map_err(|_| Error::SubsetError)?;
        let fd = font.font_dict_index(gid).ok_or(Error::MalformedFont)?;
        let range = font.char_strings.range(usize::from(gid)).ok_or(Error::MalformedIndex)?;

        let local = font.local_subrs(fd).map(|subrs| Subroutines::new(subrs, charstring_type));
        let scanner =
            Scanner::new(data, charstring_type, global, local, options.max_subroutine_depth);
        let delta = scanner.scan(range)?;

        usage.global_subrs.extend(delta.global);
        if let Some(set) = usage.local_subrs.get_mut(fd) {
            set.extend(delta.local);
        }

        for code in delta.components {
            match font.seac_glyph(data, code) {
                Some(component) => {
                    if usage.glyphs.insert(u32::from(component)) {
                        queue.push(u32::from(component));
                    }
                }
                None => log::warn!("glyph {gid} of {} uses unknown component {code}", font.name()),
            }
        }
    }

    Ok(usage)
}
