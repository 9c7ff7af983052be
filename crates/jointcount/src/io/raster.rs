use std::{fs, io::Cursor, path::Path};

use ndarray::Array2;
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use crate::{
    error::{Result, StatsError},
    traits::RasterLoader,
    types::{LabelCode, LabelRaster},
};

/// Loads `.npy` class rasters of any integer dtype, widened to `i64`.
#[derive(Debug, Clone, Default)]
pub struct NpyRasterLoader;

impl RasterLoader for NpyRasterLoader {
    fn load_raster(&self, path: &Path) -> Result<LabelRaster> {
        let bytes = fs::read(path)?;
        decode_raster(&bytes)
    }
}

macro_rules! read_as {
    ($bytes:expr; $($ty:ty),+) => {
        $(
            match Array2::<$ty>::read_npy(Cursor::new($bytes)) {
                Ok(array) => return Ok(array.mapv(|v| v as LabelCode)),
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(ReadNpyError::WrongNdim(_, found)) => {
                    return Err(StatsError::InvalidRaster(format!(
                        "expected a 2-D array, found {found} dimensions"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        )+
    };
}

/// Decodes an in-memory `.npy` payload.
pub fn decode_raster(bytes: &[u8]) -> Result<LabelRaster> {
    read_as!(bytes; i64, i32, u8, u16, i16, u32, i8, u64);
    Err(StatsError::InvalidRaster(
        "array dtype is not an integer type".to_string(),
    ))
}

/// Writes a raster as little-endian `i64` `.npy`.
pub fn write_raster<P: AsRef<Path>>(path: P, raster: &LabelRaster) -> Result<()> {
    ndarray_npy::write_npy(path, raster)?;
    Ok(())
}
