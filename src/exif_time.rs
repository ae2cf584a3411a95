use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use exif::{In, Reader, Tag, Value};
use thiserror::Error;

/// Failures while turning a composed EXIF datetime string into a timestamp.
/// All of these abort the run.
#[derive(Debug, Error)]
pub enum DateTimeError {
    #[error("can't parse EXIF datetime: {0}")]
    Malformed(String),
    #[error("non-numeric component in EXIF datetime {input:?}")]
    Numeric {
        input: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("EXIF datetime out of range: {0}")]
    OutOfRange(String),
}

/// Read the capture timestamp of an image file.
///
/// Returns the composed string `"YYYY:MM:DD hh:mm:ss ±HH:MM"`, or `None`
/// when the file carries no EXIF segment or no `DateTimeOriginal` tag —
/// common for non-camera images, so not an error. Anything else
/// (I/O failure, corrupt EXIF) is fatal.
pub fn read_exif_time(path: &Path) -> anyhow::Result<Option<String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read EXIF from {}", path.display()))
        }
    };

    let Some(datetime) = ascii_field(&exif, Tag::DateTimeOriginal) else {
        return Ok(None);
    };
    let offset =
        ascii_field(&exif, Tag::OffsetTimeOriginal).unwrap_or_else(|| "+00:00".to_string());

    // Some cameras write non-standard date separators.
    let datetime = datetime
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    Ok(Some(format!("{datetime} {offset}")))
}

/// Parse a composed `"YYYY:MM:DD hh:mm:ss ±HH:MM"` string.
///
/// The offset is applied: the result carries the embedded zone, so its
/// instant is the true capture time while its local fields still equal
/// the string's fields.
pub fn parse_exif_datetime(extime: &str) -> Result<DateTime<FixedOffset>, DateTimeError> {
    let malformed = || DateTimeError::Malformed(extime.to_string());

    let tokens: Vec<&str> = extime.split(' ').collect();
    let &[date, time, zone] = tokens.as_slice() else {
        return Err(malformed());
    };

    let ymd: Vec<&str> = date.split(':').collect();
    let hms: Vec<&str> = time.split(':').collect();
    if ymd.len() != 3 || hms.len() != 3 {
        return Err(malformed());
    }

    let year: i32 = parse_component(ymd[0], extime)?;
    let month: u32 = parse_component(ymd[1], extime)?;
    let day: u32 = parse_component(ymd[2], extime)?;
    let hour: u32 = parse_component(hms[0], extime)?;
    let minute: u32 = parse_component(hms[1], extime)?;
    let second: u32 = parse_component(hms[2], extime)?;

    let offset_secs = parse_offset(zone, extime)?;
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| DateTimeError::OutOfRange(extime.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .ok_or_else(|| DateTimeError::OutOfRange(extime.to_string()))
}

/// Parse a `±HH:MM` zone token into seconds east of UTC.
fn parse_offset(zone: &str, extime: &str) -> Result<i32, DateTimeError> {
    let pieces: Vec<&str> = zone.split(':').collect();
    let &[hh, mm] = pieces.as_slice() else {
        return Err(DateTimeError::Malformed(extime.to_string()));
    };
    let hours: i32 = parse_component(hh, extime)?;
    let minutes: i32 = parse_component(mm, extime)?;
    // "-00:30" parses its hour field to plain zero, so the sign must come
    // from the token itself.
    if zone.starts_with('-') {
        Ok(hours * 3600 - minutes * 60)
    } else {
        Ok(hours * 3600 + minutes * 60)
    }
}

fn parse_component<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    piece: &str,
    extime: &str,
) -> Result<T, DateTimeError> {
    piece.parse().map_err(|source| DateTimeError::Numeric {
        input: extime.to_string(),
        source,
    })
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        // The default display formatter wraps ASCII values in quotes, so
        // take the raw value.
        Value::Ascii(ref vec) if !vec.is_empty() => std::str::from_utf8(&vec[0])
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Build a minimal JPEG whose APP1 segment holds a little-endian TIFF with
/// `DateTimeOriginal` and optionally `OffsetTimeOriginal` in the Exif IFD.
#[cfg(test)]
pub(crate) fn exif_jpeg(datetime: &str, zone: Option<&str>) -> Vec<u8> {
    const EXIF_IFD_POINTER: u16 = 0x8769;
    const DATE_TIME_ORIGINAL: u16 = 0x9003;
    const OFFSET_TIME_ORIGINAL: u16 = 0x9011;
    const ASCII: u16 = 2;
    const LONG: u16 = 4;

    let mut values = vec![(DATE_TIME_ORIGINAL, format!("{datetime}\0"))];
    if let Some(zone) = zone {
        values.push((OFFSET_TIME_ORIGINAL, format!("{zone}\0")));
    }

    // IFD0 (one entry: the Exif IFD pointer) sits at offset 8, the Exif
    // IFD right behind it, the string values behind that.
    let exif_ifd_offset: u32 = 8 + 2 + 12 + 4;
    let mut value_offset = exif_ifd_offset + 2 + values.len() as u32 * 12 + 4;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2a\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&EXIF_IFD_POINTER.to_le_bytes());
    tiff.extend_from_slice(&LONG.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&exif_ifd_offset.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(&(values.len() as u16).to_le_bytes());
    for (tag, value) in &values {
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&ASCII.to_le_bytes());
        tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
        tiff.extend_from_slice(&value_offset.to_le_bytes());
        value_offset += value.len() as u32;
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    for (_, value) in &values {
        tiff.extend_from_slice(value.as_bytes());
    }

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((tiff.len() + 6 + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
