//! Builds small CFF fonts from scratch and takes subsets apart again.
//!
//! All offsets are written in the 5-byte DICT form, so layouts can be
//! computed up front.

#![allow(dead_code)]

pub const RLINETO: &[u8] = &[5];
pub const CALLSUBR: &[u8] = &[10];
pub const RETURN: &[u8] = &[11];
pub const ENDCHAR: &[u8] = &[14];
pub const HSTEM: &[u8] = &[1];
pub const HINTMASK: &[u8] = &[19];
pub const RMOVETO: &[u8] = &[21];
pub const CALLGSUBR: &[u8] = &[29];

const ROS: &[u8] = &[12, 30];
const CID_COUNT: &[u8] = &[12, 34];
const FD_ARRAY: &[u8] = &[12, 36];
const FD_SELECT: &[u8] = &[12, 37];
const FONT_NAME: &[u8] = &[12, 38];
const VERSION: &[u8] = &[0];
const FONT_BBOX: &[u8] = &[5];
const STD_HW: &[u8] = &[10];
const CHARSET: &[u8] = &[15];
const CHAR_STRINGS: &[u8] = &[17];
const PRIVATE: &[u8] = &[18];
const SUBRS: &[u8] = &[19];

/// The contents of a font.
pub struct FontSpec {
    pub name: &'static str,
    pub glyphs: Vec<Vec<u8>>,
    pub global_subrs: Vec<Vec<u8>>,
    /// One list of local subroutines per Font DICT.
    pub local_subrs: Vec<Vec<Vec<u8>>>,
}

/// Encode a charstring from `(operands, operator)` pairs.
pub fn charstring(ops: &[(&[i32], &[u8])]) -> Vec<u8> {
    let mut data = vec![];
    for (operands, operator) in ops {
        for &n in *operands {
            data.extend(charstring_int(n));
        }
        data.extend(*operator);
    }
    data
}

fn charstring_int(n: i32) -> Vec<u8> {
    match n {
        -107..=107 => vec![(n + 139) as u8],
        108..=1131 => {
            let n = n - 108;
            vec![(n >> 8) as u8 + 247, n as u8]
        }
        -1131..=-108 => {
            let n = -n - 108;
            vec![(n >> 8) as u8 + 251, n as u8]
        }
        _ => {
            let [a, b] = (n as i16).to_be_bytes();
            vec![28, a, b]
        }
    }
}

/// Encode a DICT from `(operands, operator)` pairs.
fn dict(entries: &[(&[i32], &[u8])]) -> Vec<u8> {
    let mut data = vec![];
    for (operands, operator) in entries {
        for &n in *operands {
            data.push(29);
            data.extend(n.to_be_bytes());
        }
        data.extend(*operator);
    }
    data
}

/// Encode an INDEX.
pub fn index<T: AsRef<[u8]>>(objects: &[T]) -> Vec<u8> {
    let count = objects.len() as u16;
    let mut data = count.to_be_bytes().to_vec();
    if count == 0 {
        return data;
    }

    let total: usize = objects.iter().map(|o| o.as_ref().len()).sum();
    let size = match total + 1 {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    };

    data.push(size as u8);
    let mut offset = 1u32;
    data.extend(&offset.to_be_bytes()[4 - size..]);
    for object in objects {
        offset += object.as_ref().len() as u32;
        data.extend(&offset.to_be_bytes()[4 - size..]);
    }
    for object in objects {
        data.extend(object.as_ref());
    }
    data
}

fn private_dict(subrs: &[Vec<u8>]) -> Vec<u8> {
    let mut entries: Vec<(&[i32], &[u8])> = vec![(&[50][..], STD_HW)];
    // The Subrs INDEX directly follows the Private DICT.
    let len = [dict(&[(&[50], STD_HW), (&[0], SUBRS)]).len() as i32];
    if !subrs.is_empty() {
        entries.push((&len, SUBRS));
    }
    dict(&entries)
}

fn local_subrs(subrs: &[Vec<u8>]) -> Vec<u8> {
    if subrs.is_empty() {
        vec![]
    } else {
        index(subrs)
    }
}

/// Build a name-keyed font with a single Private DICT.
pub fn name_keyed(spec: &FontSpec) -> Vec<u8> {
    let subrs = spec.local_subrs.first().map(Vec::as_slice).unwrap_or_default();

    let header = vec![1, 0, 4, 4];
    let names = index(&[spec.name]);
    let strings = index(&[&b"Version 1.0"[..]]);
    let global_subrs = index(&spec.global_subrs);
    let char_strings = index(&spec.glyphs);
    let private = private_dict(subrs);
    let local = local_subrs(subrs);

    let top_dict = |char_strings_offset: usize, private_offset: usize| {
        dict(&[
            (&[391], VERSION),
            (&[0, -10, 500, 700], FONT_BBOX),
            (&[char_strings_offset as i32], CHAR_STRINGS),
            (&[private.len() as i32, private_offset as i32], PRIVATE),
        ])
    };

    let top_dicts_len = index(&[top_dict(0, 0)]).len();
    let char_strings_offset =
        header.len() + names.len() + top_dicts_len + strings.len() + global_subrs.len();
    let private_offset = char_strings_offset + char_strings.len();

    let mut data = header;
    data.extend(names);
    data.extend(index(&[top_dict(char_strings_offset, private_offset)]));
    data.extend(strings);
    data.extend(global_subrs);
    data.extend(char_strings);
    data.extend(private);
    data.extend(local);
    data
}

/// Build a CID-keyed font. `fds` maps each glyph to a Font DICT and `cids`
/// holds the CIDs of all glyphs after .notdef.
pub fn cid_keyed(spec: &FontSpec, fds: &[u8], cids: &[u16]) -> Vec<u8> {
    let mut strings: Vec<Vec<u8>> = vec![b"Adobe".to_vec(), b"Identity".to_vec()];
    for i in 0..spec.local_subrs.len() {
        strings.push(format!("{}-FD{i}", spec.name).into_bytes());
    }

    let header = vec![1, 0, 4, 4];
    let names = index(&[spec.name]);
    let strings = index(&strings);
    let global_subrs = index(&spec.global_subrs);
    let char_strings = index(&spec.glyphs);

    let mut charset = vec![0];
    for cid in cids {
        charset.extend(cid.to_be_bytes());
    }

    let fd_select = fd_select_format_3(fds);

    let privates: Vec<Vec<u8>> = spec.local_subrs.iter().map(|s| private_dict(s)).collect();
    let locals: Vec<Vec<u8>> = spec.local_subrs.iter().map(|s| local_subrs(s)).collect();

    let font_dict = |i: usize, offset: usize| {
        dict(&[
            (&[393 + i as i32], FONT_NAME),
            (&[privates[i].len() as i32, offset as i32], PRIVATE),
        ])
    };

    let top_dict = |fd_array: usize, fd_select: usize, charset: usize, char_strings: usize| {
        dict(&[
            (&[391, 392, 0], ROS),
            (&[0, -10, 500, 700], FONT_BBOX),
            (&[spec.glyphs.len() as i32], CID_COUNT),
            (&[fd_array as i32], FD_ARRAY),
            (&[fd_select as i32], FD_SELECT),
            (&[charset as i32], CHARSET),
            (&[char_strings as i32], CHAR_STRINGS),
        ])
    };

    let dummy_fd_array: Vec<Vec<u8>> =
        (0..privates.len()).map(|i| font_dict(i, 0)).collect();
    let fd_array_len = index(&dummy_fd_array).len();
    let top_dicts_len = index(&[top_dict(0, 0, 0, 0)]).len();

    let charset_offset =
        header.len() + names.len() + top_dicts_len + strings.len() + global_subrs.len();
    let fd_select_offset = charset_offset + charset.len();
    let fd_array_offset = fd_select_offset + fd_select.len();

    let mut offset = fd_array_offset + fd_array_len;
    let mut font_dicts = vec![];
    for (i, (private, local)) in privates.iter().zip(&locals).enumerate() {
        font_dicts.push(font_dict(i, offset));
        offset += private.len() + local.len();
    }
    let char_strings_offset = offset;

    let mut data = header;
    data.extend(names);
    data.extend(index(&[top_dict(
        fd_array_offset,
        fd_select_offset,
        charset_offset,
        char_strings_offset,
    )]));
    data.extend(strings);
    data.extend(global_subrs);
    data.extend(charset);
    data.extend(fd_select);
    data.extend(index(&font_dicts));
    for (private, local) in privates.into_iter().zip(locals) {
        data.extend(private);
        data.extend(local);
    }
    assert_eq!(data.len(), char_strings_offset);
    data.extend(char_strings);
    data
}

fn fd_select_format_3(fds: &[u8]) -> Vec<u8> {
    let mut ranges: Vec<(u16, u8)> = vec![];
    for (gid, &fd) in fds.iter().enumerate() {
        if ranges.last().map(|&(_, last)| last) != Some(fd) {
            ranges.push((gid as u16, fd));
        }
    }

    let mut data = vec![3];
    data.extend((ranges.len() as u16).to_be_bytes());
    for (first, fd) in ranges {
        data.extend(first.to_be_bytes());
        data.push(fd);
    }
    data.extend((fds.len() as u16).to_be_bytes());
    data
}

/// A DICT as `(operator, operands)` pairs.
pub type Dict = Vec<(Vec<u8>, Vec<i32>)>;

/// Look up the operands of `operator`.
pub fn get<'a>(dict: &'a Dict, operator: &[u8]) -> Option<&'a [i32]> {
    dict.iter().find(|(op, _)| op == operator).map(|(_, operands)| operands.as_slice())
}

/// The decoded structures of a single-font CFF file.
#[derive(Debug)]
pub struct Inspected {
    pub top_dict: Dict,
    pub strings: Vec<Vec<u8>>,
    pub global_subrs: Vec<Vec<u8>>,
    pub char_strings: Vec<Vec<u8>>,
    pub charset: Vec<u8>,
    pub fd_select: Vec<u8>,
    pub font_dicts: Vec<Dict>,
    pub private_dicts: Vec<Dict>,
    pub local_subrs: Vec<Vec<Vec<u8>>>,
}

/// Take a CFF file apart, independently of the subsetter.
pub fn inspect(data: &[u8]) -> Inspected {
    let header_size = data[2] as usize;
    let (_, end) = read_index(data, header_size);
    let (top_dicts, end) = read_index(data, end);
    let (strings, end) = read_index(data, end);
    let (global_subrs, _) = read_index(data, end);

    let top_dict = parse_dict(&top_dicts[0]);
    let offset = |op: &[u8]| get(&top_dict, op).map(|o| o[0] as usize);

    let (char_strings, _) = read_index(data, offset(CHAR_STRINGS).unwrap());
    let glyph_count = char_strings.len();

    let charset = match offset(CHARSET) {
        Some(o) if o > 2 => data[o..o + charset_len(&data[o..], glyph_count)].to_vec(),
        _ => vec![],
    };

    let fd_select = match offset(FD_SELECT) {
        Some(o) => {
            let len = match data[o] {
                0 => 1 + glyph_count,
                _ => 5 + 3 * u16::from_be_bytes([data[o + 1], data[o + 2]]) as usize,
            };
            data[o..o + len].to_vec()
        }
        None => vec![],
    };

    let font_dicts: Vec<Dict> = match offset(FD_ARRAY) {
        Some(o) => read_index(data, o).0.iter().map(|d| parse_dict(d)).collect(),
        None => vec![top_dict.clone()],
    };

    let mut private_dicts = vec![];
    let mut local_subrs = vec![];
    for font_dict in &font_dicts {
        let Some(&[len, start]) = get(font_dict, PRIVATE) else {
            private_dicts.push(vec![]);
            local_subrs.push(vec![]);
            continue;
        };

        let (len, start) = (len as usize, start as usize);
        let private = parse_dict(&data[start..start + len]);
        let subrs = match get(&private, SUBRS) {
            Some(&[o]) => read_index(data, start + o as usize).0,
            _ => vec![],
        };

        private_dicts.push(private);
        local_subrs.push(subrs);
    }

    let font_dicts = if offset(FD_ARRAY).is_some() { font_dicts } else { vec![] };

    Inspected {
        top_dict,
        strings,
        global_subrs,
        char_strings,
        charset,
        fd_select,
        font_dicts,
        private_dicts,
        local_subrs,
    }
}

fn read_index(data: &[u8], start: usize) -> (Vec<Vec<u8>>, usize) {
    let count = u16::from_be_bytes([data[start], data[start + 1]]) as usize;
    if count == 0 {
        return (vec![], start + 2);
    }

    let size = data[start + 2] as usize;
    let offset = |i: usize| {
        let at = start + 3 + i * size;
        data[at..at + size].iter().fold(0usize, |acc, &b| acc << 8 | b as usize)
    };

    let base = start + 3 + (count + 1) * size - 1;
    let objects = (0..count)
        .map(|i| data[base + offset(i)..base + offset(i + 1)].to_vec())
        .collect();
    (objects, base + offset(count))
}

fn parse_dict(data: &[u8]) -> Dict {
    let mut entries = vec![];
    let mut operands = vec![];
    let mut i = 0;
    while i < data.len() {
        let b0 = data[i];
        match b0 {
            28 => {
                operands.push(i16::from_be_bytes([data[i + 1], data[i + 2]]) as i32);
                i += 3;
            }
            29 => {
                operands.push(i32::from_be_bytes([
                    data[i + 1],
                    data[i + 2],
                    data[i + 3],
                    data[i + 4],
                ]));
                i += 5;
            }
            30 => {
                // Reals are not needed, skip to the terminating nibble.
                i += 1;
                while data[i] & 0x0F != 0x0F && data[i] >> 4 != 0x0F {
                    i += 1;
                }
                i += 1;
                operands.push(0);
            }
            32..=246 => {
                operands.push(b0 as i32 - 139);
                i += 1;
            }
            247..=250 => {
                operands.push((b0 as i32 - 247) * 256 + data[i + 1] as i32 + 108);
                i += 2;
            }
            251..=254 => {
                operands.push(-(b0 as i32 - 251) * 256 - data[i + 1] as i32 - 108);
                i += 2;
            }
            12 => {
                entries.push((vec![12, data[i + 1]], std::mem::take(&mut operands)));
                i += 2;
            }
            _ => {
                entries.push((vec![b0], std::mem::take(&mut operands)));
                i += 1;
            }
        }
    }
    entries
}

fn charset_len(data: &[u8], glyph_count: usize) -> usize {
    let covered = glyph_count - 1;
    match data[0] {
        0 => 1 + 2 * covered,
        format => {
            let range_len = if format == 1 { 3 } else { 4 };
            let (mut seen, mut len) = (0, 1);
            while seen < covered {
                let left = match format {
                    1 => data[len + 2] as usize,
                    _ => u16::from_be_bytes([data[len + 2], data[len + 3]]) as usize,
                };
                seen += left + 1;
                len += range_len;
            }
            len
        }
    }
}
