use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use num_traits::NumCast;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::{ColorType, TiffError, TiffResult};

use super::{GeoTransform, Grid, PixelType, Raster};
use crate::{Result, SegtileError};

/// Reduced levels stop once the longer side drops under this many pixels
const MIN_OVERVIEW_SIZE: usize = 64;

/// Georeferencing of a GeoTIFF without reading its samples
pub fn read_grid(path: &Path) -> Result<(Grid, String)> {
    let mut decoder = open(path)?;
    let grid = header(&mut decoder).map_err(|e| SegtileError::tiff(path, e))?;
    let projection = projection(&mut decoder).map_err(|e| SegtileError::tiff(path, e))?;
    Ok((grid, projection))
}

/// Reads a whole GeoTIFF
pub fn read_raster(path: &Path) -> Result<Raster> {
    let mut decoder = open(path)?;
    let grid = header(&mut decoder).map_err(|e| SegtileError::tiff(path, e))?;
    read_part(&mut decoder, path, grid, 0, 0, grid)
}

/// Reads the part of a GeoTIFF overlapping `window`, decoding only the strips
/// or tiles covering it. The result stays on the file's pixel lattice.
pub fn read_window(path: &Path, window: &Grid) -> Result<Raster> {
    let mut decoder = open(path)?;
    let grid = header(&mut decoder).map_err(|e| SegtileError::tiff(path, e))?;
    let part = grid.intersect(window)?;
    let col0 = ((part.geo.origin_x - grid.geo.origin_x) / grid.geo.pixel_width).round() as usize;
    let row0 = ((grid.geo.origin_y - part.geo.origin_y) / grid.geo.pixel_height).round() as usize;
    log::debug!(
        "{}: window {}x{} at ({}, {})",
        path.display(), part.width, part.height, col0, row0
    );
    read_part(&mut decoder, path, grid, col0, row0, part)
}

/// Writes `raster` as a GeoTIFF, followed by nearest neighbour overviews when `pyramids`.
pub fn write_raster(path: &Path, raster: &Raster, pyramids: bool) -> Result<()> {
    let mut buffer = Cursor::new(Vec::new());
    encode(&mut buffer, raster, pyramids).map_err(|e| SegtileError::tiff(path, e))?;
    fs::write(path, buffer.into_inner()).map_err(|e| SegtileError::io(path, e))
}

/// Overview decimation factors for a raster of the given size
pub fn overview_factors(width: usize, height: usize) -> Vec<u32> {
    let longer = width.max(height);
    let mut factors = vec![];
    let mut factor = 2usize;
    while longer.div_ceil(factor) >= MIN_OVERVIEW_SIZE {
        factors.push(factor as u32);
        factor *= 2;
    }
    factors
}

fn open(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path).map_err(|e| SegtileError::io(path, e))?;
    Decoder::new(BufReader::new(file)).map_err(|e| SegtileError::tiff(path, e))
}

fn header<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Grid> {
    let (width, height) = decoder.dimensions()?;
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag)?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag)?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(TiffError::FormatError(tiff::TiffFormatError::Format(
            "incomplete georeferencing tags".to_owned(),
        )));
    }
    // tie point (i, j, k, x, y, z) maps raster (i, j) onto world (x, y)
    let geo = GeoTransform {
        origin_x: tiepoint[3] - tiepoint[0] * scale[0],
        origin_y: tiepoint[4] + tiepoint[1] * scale[1],
        pixel_width: scale[0],
        pixel_height: scale[1],
    };
    Ok(Grid { width: width as usize, height: height as usize, geo })
}

fn projection<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<String> {
    match decoder.find_tag(Tag::GeoAsciiParamsTag)? {
        Some(value) => value.into_string(),
        None => Ok(String::new()),
    }
}

fn pixel_type<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<PixelType> {
    match decoder.colortype().map_err(|e| SegtileError::tiff(path, e))? {
        ColorType::Gray(8) => Ok(PixelType::U8),
        ColorType::Gray(16) => Ok(PixelType::U16),
        ColorType::Gray(32) => Ok(PixelType::U32),
        other => Err(SegtileError::Raster(format!(
            "{}: unsupported sample layout {:?}", path.display(), other
        ))),
    }
}

fn widen(result: DecodingResult) -> Option<Vec<u32>> {
    match result {
        DecodingResult::U8(v) => Some(v.into_iter().map(<u32 as From<u8>>::from).collect()),
        DecodingResult::U16(v) => Some(v.into_iter().map(<u32 as From<u16>>::from).collect()),
        DecodingResult::U32(v) => Some(v),
        _ => None,
    }
}

fn read_part<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
    grid: Grid,
    col0: usize,
    row0: usize,
    part: Grid,
) -> Result<Raster> {
    let pixel_type = pixel_type(decoder, path)?;
    let projection = projection(decoder).map_err(|e| SegtileError::tiff(path, e))?;
    let (chunk_width, chunk_height) = decoder.chunk_dimensions();
    let (chunk_width, chunk_height) = (chunk_width as usize, chunk_height as usize);
    let across = grid.width.div_ceil(chunk_width);
    let (col1, row1) = (col0 + part.width, row0 + part.height);

    let mut data = vec![0u32; part.len()];
    for ty in row0 / chunk_height..=(row1 - 1) / chunk_height {
        for tx in col0 / chunk_width..=(col1 - 1) / chunk_width {
            let index = (ty * across + tx) as u32;
            let (data_width, data_height) = decoder.chunk_data_dimensions(index);
            let (data_width, data_height) = (data_width as usize, data_height as usize);
            let chunk = decoder
                .read_chunk(index)
                .map_err(|e| SegtileError::tiff(path, e))
                .and_then(|result| {
                    widen(result).ok_or_else(|| {
                        SegtileError::Raster(format!("{}: samples are not unsigned", path.display()))
                    })
                })?;
            let (x0, y0) = (tx * chunk_width, ty * chunk_height);
            for y in y0.max(row0)..(y0 + data_height).min(row1) {
                for x in x0.max(col0)..(x0 + data_width).min(col1) {
                    data[(y - row0) * part.width + (x - col0)] =
                        chunk[(y - y0) * data_width + (x - x0)];
                }
            }
        }
    }

    Ok(Raster { grid: part, projection, pixel_type, data })
}

fn encode<W: Write + Seek>(writer: &mut W, raster: &Raster, pyramids: bool) -> TiffResult<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    write_level(&mut encoder, raster, raster.grid, &raster.data, false)?;
    if !pyramids {
        return Ok(());
    }
    for factor in overview_factors(raster.width(), raster.height()) {
        let factor = factor as usize;
        let grid = Grid {
            width: raster.width().div_ceil(factor),
            height: raster.height().div_ceil(factor),
            geo: GeoTransform {
                pixel_width: raster.grid.geo.pixel_width * factor as f64,
                pixel_height: raster.grid.geo.pixel_height * factor as f64,
                ..raster.grid.geo
            },
        };
        let mut data = Vec::with_capacity(grid.len());
        for y in 0..grid.height {
            for x in 0..grid.width {
                data.push(raster.get(x * factor, y * factor));
            }
        }
        write_level(&mut encoder, raster, grid, &data, true)?;
    }
    Ok(())
}

fn write_level<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster,
    grid: Grid,
    data: &[u32],
    overview: bool,
) -> TiffResult<()> {
    match raster.pixel_type {
        PixelType::U8 => write_ifd::<_, colortype::Gray8>(encoder, raster, grid, &narrow(data)?, overview),
        PixelType::U16 => write_ifd::<_, colortype::Gray16>(encoder, raster, grid, &narrow(data)?, overview),
        PixelType::U32 => write_ifd::<_, colortype::Gray32>(encoder, raster, grid, data, overview),
    }
}

fn write_ifd<W, C>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster,
    grid: Grid,
    data: &[C::Inner],
    overview: bool,
) -> TiffResult<()>
where
    W: Write + Seek,
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let mut image = encoder.new_image::<C>(grid.width as u32, grid.height as u32)?;
    let directory = image.encoder();
    if overview {
        directory.write_tag(Tag::NewSubfileType, 1u32)?;
    }
    directory.write_tag(
        Tag::ModelPixelScaleTag,
        &[grid.geo.pixel_width, grid.geo.pixel_height, 0.0][..],
    )?;
    directory.write_tag(
        Tag::ModelTiepointTag,
        &[0.0, 0.0, 0.0, grid.geo.origin_x, grid.geo.origin_y, 0.0][..],
    )?;
    directory.write_tag(Tag::GeoAsciiParamsTag, raster.projection.as_str())?;
    directory.write_tag(Tag::GdalNodata, "0")?;
    image.write_data(data)
}

fn narrow<T: NumCast>(data: &[u32]) -> TiffResult<Vec<T>> {
    data.iter()
        .map(|&v| {
            T::from(v).ok_or_else(|| {
                TiffError::FormatError(tiff::TiffFormatError::Format(format!(
                    "sample {} does not fit the pixel type", v
                )))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Extent;

    fn raster(width: usize, height: usize, pixel_type: PixelType) -> Raster {
        let grid = Grid::from_extent(
            Extent::new(100.0, 200.0, 100.0 + width as f64 * 2.0, 200.0 + height as f64 * 2.0),
            2.0,
        ).unwrap();
        Raster {
            grid,
            projection: "LOCAL_CS[\"test\"]".to_owned(),
            pixel_type,
            data: (0..grid.len() as u32).map(|v| v % 251).collect(),
        }
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.tif");
        let original = raster(7, 5, PixelType::U8);
        write_raster(&path, &original, false).unwrap();
        assert_eq!(read_raster(&path).unwrap(), original);
        let (grid, projection) = read_grid(&path).unwrap();
        assert_eq!(grid, original.grid);
        assert_eq!(projection, "LOCAL_CS[\"test\"]");
    }

    #[test]
    fn narrow_samples_widen_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r16.tif");
        let mut original = raster(6, 4, PixelType::U16);
        original.data[5] = 60_000;
        write_raster(&path, &original, false).unwrap();
        let read = read_raster(&path).unwrap();
        assert_eq!(read.pixel_type, PixelType::U16);
        assert_eq!(read.data, original.data);
    }

    #[test]
    fn read_window_crops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.tif");
        let original = raster(300, 200, PixelType::U32);
        write_raster(&path, &original, true).unwrap();
        let window = Grid::from_extent(Extent::new(90.0, 590.0, 110.0, 700.0), 2.0).unwrap();
        let part = read_window(&path, &window).unwrap();
        assert_eq!(part.grid.extent(), Extent::new(100.0, 590.0, 110.0, 600.0));
        assert_eq!((part.width(), part.height()), (5, 5));
        assert_eq!(part.get(0, 0), original.get(0, 0));
        assert_eq!(part.get(4, 4), original.get(4, 4));
        assert_eq!(part.data, part.sample(&part.grid));
    }

    #[test]
    fn narrow_rejects_overflow() {
        assert!(narrow::<u8>(&[1, 256]).is_err());
        assert_eq!(narrow::<u16>(&[1, 256]).unwrap(), vec![1u16, 256]);
    }

    #[test]
    fn overviews_stop_at_min_size() {
        assert_eq!(overview_factors(100, 30), Vec::<u32>::new());
        assert_eq!(overview_factors(300, 10), vec![2, 4]);
        assert_eq!(overview_factors(128, 128), vec![2]);
    }
}
