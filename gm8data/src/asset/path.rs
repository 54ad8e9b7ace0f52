use crate::{asset::checked_count, stream::ReadPasExt, Error};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

#[derive(Debug)]
pub struct Path {
    pub name: String,
    /// 0 = straight lines, 1 = smooth curve.
    pub kind: u32,
    pub closed: bool,
    pub precision: u32,
    pub points: Vec<PathPoint>,
}

#[derive(Debug)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
}

impl Path {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>) -> Result<Self, Error> {
        let name = data.read_pas_string()?;
        data.seek(SeekFrom::Current(4))?; // data version
        let kind = data.read_u32::<LE>()?;
        let closed = data.read_u32::<LE>()? != 0;
        let precision = data.read_u32::<LE>()?;

        let count = data.read_u32::<LE>()?;
        let count = checked_count(data, count, 24, "path point count out of bounds")?;
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(PathPoint {
                x: data.read_f64::<LE>()?,
                y: data.read_f64::<LE>()?,
                speed: data.read_f64::<LE>()?,
            });
        }

        Ok(Path { name, kind, closed, precision, points })
    }
}
