//! Single-band GeoTIFF reading and writing.
//!
//! Samples of any integer or float type are read into f64. Output is always
//! written as 64-bit float. Georeferencing tags are not interpreted; they
//! are copied from the input file to the output file as-is.
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use dynex_core::Grid;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tiff::ColorType;

// ── GeoTIFF tag numbers ──────────────────────────────────────────────────────

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_DOUBLE_PARAMS: u16 = 34736;
const GEO_ASCII_PARAMS: u16 = 34737;
const GDAL_NODATA: u16 = 42113;

/// Georeferencing carried from input to output untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoMetadata {
    pub pixel_scale: Option<Vec<f64>>,
    pub tiepoint: Option<Vec<f64>>,
    pub transformation: Option<Vec<f64>>,
    pub geo_keys: Option<Vec<u16>>,
    pub geo_doubles: Option<Vec<f64>>,
    pub geo_ascii: Option<String>,
    pub nodata: Option<String>,
}

impl GeoMetadata {
    pub fn is_georeferenced(&self) -> bool {
        self.geo_keys.is_some() || self.transformation.is_some() || self.tiepoint.is_some()
    }
}

/// A grid together with the metadata needed to write it back.
#[derive(Debug, Clone)]
pub struct Raster {
    pub grid: Grid,
    pub geo: GeoMetadata,
}

pub fn read_geotiff(path: &Path) -> Result<Raster> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    decode_geotiff(BufReader::new(file))
        .with_context(|| format!("Cannot decode {}", path.display()))
}

pub fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster> {
    let mut decoder = Decoder::new(reader).context("not a valid TIFF")?;

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => bail!("expected a single-band raster, found {other:?}"),
    }

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let data: Vec<f64> = match decoder.read_image()? {
        DecodingResult::F64(v) => v,
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        _ => bail!("unsupported sample format"),
    };

    let grid = Grid::from_vec(data, width, height)?;
    let geo = read_geo_metadata(&mut decoder)?;
    Ok(Raster { grid, geo })
}

fn read_geo_metadata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoMetadata> {
    let mut f64_tag = |tag: u16| -> Result<Option<Vec<f64>>> {
        Ok(match decoder.find_tag(Tag::Unknown(tag))? {
            Some(v) => Some(v.into_f64_vec()?),
            None => None,
        })
    };
    let pixel_scale = f64_tag(MODEL_PIXEL_SCALE)?;
    let tiepoint = f64_tag(MODEL_TIEPOINT)?;
    let transformation = f64_tag(MODEL_TRANSFORMATION)?;
    let geo_doubles = f64_tag(GEO_DOUBLE_PARAMS)?;

    let geo_keys = match decoder.find_tag(Tag::Unknown(GEO_KEY_DIRECTORY))? {
        Some(v) => Some(v.into_u16_vec()?),
        None => None,
    };
    let mut ascii_tag = |tag: u16| -> Result<Option<String>> {
        Ok(match decoder.find_tag(Tag::Unknown(tag))? {
            Some(v) => Some(v.into_string()?.trim_end_matches('\0').to_string()),
            None => None,
        })
    };
    let geo_ascii = ascii_tag(GEO_ASCII_PARAMS)?;
    let nodata = ascii_tag(GDAL_NODATA)?;

    Ok(GeoMetadata {
        pixel_scale,
        tiepoint,
        transformation,
        geo_keys,
        geo_doubles,
        geo_ascii,
        nodata,
    })
}

pub fn write_geotiff(path: &Path, grid: &Grid, geo: &GeoMetadata) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(&mut writer, grid, geo)
        .with_context(|| format!("Cannot encode {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn encode_geotiff<W: Write + Seek>(writer: W, grid: &Grid, geo: &GeoMetadata) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<Gray64Float>(grid.width as u32, grid.height as u32)?;

    let tags = image.encoder();
    if let Some(v) = &geo.pixel_scale {
        tags.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), v.as_slice())?;
    }
    if let Some(v) = &geo.tiepoint {
        tags.write_tag(Tag::Unknown(MODEL_TIEPOINT), v.as_slice())?;
    }
    if let Some(v) = &geo.transformation {
        tags.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), v.as_slice())?;
    }
    if let Some(v) = &geo.geo_keys {
        tags.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), v.as_slice())?;
    }
    if let Some(v) = &geo.geo_doubles {
        tags.write_tag(Tag::Unknown(GEO_DOUBLE_PARAMS), v.as_slice())?;
    }
    if let Some(s) = &geo.geo_ascii {
        tags.write_tag(Tag::Unknown(GEO_ASCII_PARAMS), s.as_str())?;
    }
    if let Some(s) = &geo.nodata {
        tags.write_tag(Tag::Unknown(GDAL_NODATA), s.as_str())?;
    }

    image.write_data(&grid.data)?;
    Ok(())
}
