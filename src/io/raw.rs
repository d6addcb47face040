//! Read / write grids and measurements as raw little-endian binary

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::grid::{Grid, GridGeometry};
use crate::types::Sample;

/// Samples with a fixed-width little-endian representation
pub trait RawSample: Sample {
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;
    fn to_le(self) -> Self::Bytes;
    fn from_le(bytes: Self::Bytes) -> Self;
}

impl RawSample for f32 {
    type Bytes = [u8; 4];
    fn to_le(self) -> Self::Bytes { self.to_le_bytes() }
    fn from_le(bytes: Self::Bytes) -> Self { f32::from_le_bytes(bytes) }
}

impl RawSample for f64 {
    type Bytes = [u8; 8];
    fn to_le(self) -> Self::Bytes { self.to_le_bytes() }
    fn from_le(bytes: Self::Bytes) -> Self { f64::from_le_bytes(bytes) }
}

pub fn write<T: RawSample>(data: impl IntoIterator<Item = T>, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(datum.to_le().as_ref())?;
    }
    buf.flush()
}

type IORes<T> = std::io::Result<T>;
pub fn read<T: RawSample>(path: &Path) -> IORes<impl Iterator<Item = IORes<T>>> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::UnexpectedEof;
        let mut bytes = T::Bytes::default();
        match buf.read_exact(bytes.as_mut()) {
            Ok(()) => Some(Ok(T::from_le(bytes))),
            Err(e) if e.kind() == UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }))
}

/// Read all `n_frames` frames of a grid with the given geometry
pub fn read_grid<T: RawSample>(path: &Path, geometry: GridGeometry, n_frames: usize) -> Result<Grid<T>> {
    let data = read::<T>(path)?.collect::<IORes<Vec<T>>>()?;
    Grid::from_frames(geometry, n_frames, data)
}

pub fn write_grid<T: RawSample>(grid: &Grid<T>, path: &Path) -> Result<()> {
    write(grid.data.iter().copied(), path).map_err(Error::from)
}
