use crate::{stream::ReadPasExt, zlib::BlockReader, Error};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

pub struct Extension {
    pub name: String,
    pub folder_name: String,
    pub files: Vec<ExtensionFile>,
}

pub struct ExtensionFile {
    pub file_name: String,
    /// 1 = dll, 2 = gml, 3 = lib, 4 = other.
    pub kind: u32,
    pub initializer: String,
    pub finalizer: String,
    pub functions: Vec<ExtensionFileFunction>,
    pub consts: Vec<ExtensionFileConst>,
    /// The file's payload, decrypted and inflated.
    pub data: Box<[u8]>,
}

#[derive(Debug)]
pub struct ExtensionFileFunction {
    pub name: String,
    pub external_name: String,
    /// Calling convention: stdcall or cdecl.
    pub convention: u32,
    pub arg_count: u32,
    /// 1 = string, 2 = real.
    pub arg_types: [u32; 17],
    pub return_type: u32,
}

#[derive(Debug)]
pub struct ExtensionFileConst {
    pub name: String,
    pub value: String,
}

impl Extension {
    /// Reads one extension, including its data region. The region is
    /// substitution-ciphered with a table derived from its leading seed
    /// dword, then holds one zlib block per file, which must be copied out
    /// of the shared inflate buffer before it's reused.
    pub(crate) fn read(exe: &mut io::Cursor<&mut [u8]>, block: &mut BlockReader) -> Result<Self, Error> {
        exe.seek(SeekFrom::Current(4))?; // data version
        let name = exe.read_pas_string()?;
        let folder_name = exe.read_pas_string()?;

        let file_count = exe.read_u32::<LE>()? as usize;
        let mut files = Vec::with_capacity(file_count.min(0x1000));
        for _ in 0..file_count {
            exe.seek(SeekFrom::Current(4))?; // data version
            let file_name = exe.read_pas_string()?;
            let kind = exe.read_u32::<LE>()?;
            let initializer = exe.read_pas_string()?;
            let finalizer = exe.read_pas_string()?;

            let function_count = exe.read_u32::<LE>()? as usize;
            let mut functions = Vec::with_capacity(function_count.min(0x1000));
            for _ in 0..function_count {
                exe.seek(SeekFrom::Current(4))?; // data version
                let name = exe.read_pas_string()?;
                let external_name = exe.read_pas_string()?;
                let convention = exe.read_u32::<LE>()?;
                exe.seek(SeekFrom::Current(4))?; // always zero
                let arg_count = exe.read_u32::<LE>()?;
                let mut arg_types = [0u32; 17];
                for entry in arg_types.iter_mut() {
                    *entry = exe.read_u32::<LE>()?;
                }
                let return_type = exe.read_u32::<LE>()?;
                functions.push(ExtensionFileFunction { name, external_name, convention, arg_count, arg_types, return_type });
            }

            let const_count = exe.read_u32::<LE>()? as usize;
            let mut consts = Vec::with_capacity(const_count.min(0x1000));
            for _ in 0..const_count {
                exe.seek(SeekFrom::Current(4))?; // data version
                consts.push(ExtensionFileConst { name: exe.read_pas_string()?, value: exe.read_pas_string()? });
            }

            files.push(ExtensionFile {
                file_name,
                kind,
                initializer,
                finalizer,
                functions,
                consts,
                data: Box::new([]),
            });
        }

        // The data region: a seed dword, one byte the cipher leaves alone,
        // then the substituted remainder.
        let region_len = exe.read_u32::<LE>()? as usize;
        let start = exe.position() as usize;
        let end = start.checked_add(region_len).filter(|&end| end <= exe.get_ref().len());
        let end = end.ok_or(Error::MalformedData("extension data region extends past end of file"))?;

        if region_len >= 4 {
            let data: &mut [u8] = exe.get_mut();
            let seed = i32::from_le_bytes([data[start], data[start + 1], data[start + 2], data[start + 3]]);
            let table = char_table(seed);
            if end > start + 5 {
                for b in &mut data[start + 5..end] {
                    *b = table[*b as usize + 0x100];
                }
            }
        }

        exe.set_position((start + 4).min(end) as u64);
        for file in &mut files {
            let chunk = block.inflate(exe)?;
            file.data = chunk.to_vec().into_boxed_slice();
        }
        exe.set_position(end as u64);

        Ok(Extension { name, folder_name, files })
    }
}

/// Builds the 512-entry substitution table for an extension data region.
/// The lower half is a pseudo-random permutation, the upper half its inverse
/// (which is what decryption reads through).
fn char_table(seed: i32) -> [u8; 512] {
    let mut seed1 = seed;
    let mut seed2 = (seed1 % 250) + 6;
    seed1 /= 250;
    if seed1 < 0 {
        seed1 += 100
    }
    if seed2 < 0 {
        seed2 += 100
    }

    let mut table = [0u8; 512];
    for (i, b) in table.iter_mut().enumerate() {
        *b = i as u8;
    }
    for i in 1u32..10001 {
        let ax = (i.wrapping_mul(seed2 as u32).wrapping_add(seed1 as u32) % 0xFE) + 1;
        table.swap(ax as usize, ax as usize + 1);
    }
    for i in 0..0x100 {
        let dx = table[i + 1] as usize;
        table[dx + 0x100] = (i as u8).wrapping_add(1);
    }
    table
}
