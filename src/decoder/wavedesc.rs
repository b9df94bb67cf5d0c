//! WAVEDESC block decoder for LeCroy waveform responses
//!
//! A `WF?` response carries a 2-byte origin tag, then a self-delimiting
//! binary block: `'#'`, one ASCII digit giving the number of length digits,
//! the decimal block length, then the block itself. The block starts with the
//! WAVEDESC descriptor: fixed-offset fields describing its own layout
//! (section lengths, sample encoding, byte order) followed by the raw sample
//! array. Every multi-byte field is interpreted with the byte order declared
//! at `COMM_ORDER`, so the descriptor has to be read in two steps: the two
//! single-byte tags first, everything else after.

use super::common::{Origin, Waveform};
use super::error::{DecodeError, DecodeResult};

/// WAVEDESC field offsets, relative to the start of the block
///
/// Names follow the LeCroy template (`TEMPLATE?` output). `RES_ARRAY1` is at
/// offset 56, directly after `RIS_TIME_ARRAY`.
mod offsets {
    pub const COMM_TYPE: usize = 32;
    pub const COMM_ORDER: usize = 34;
    pub const WAVE_DESCRIPTOR: usize = 36;
    pub const USER_TEXT: usize = 40;
    pub const RES_DESC1: usize = 44;
    pub const TRIGTIME_ARRAY: usize = 48;
    pub const RIS_TIME_ARRAY: usize = 52;
    pub const RES_ARRAY1: usize = 56;
    pub const WAVE_ARRAY_1: usize = 60;
    pub const WAVE_ARRAY_COUNT: usize = 116;
    pub const VERTICAL_GAIN: usize = 156;
    pub const VERTICAL_OFFSET: usize = 160;
    pub const HORIZ_INTERVAL: usize = 176;
    pub const HORIZ_OFFSET: usize = 180;
    pub const VERTUNIT: usize = 196;
    pub const HORUNIT: usize = 244;
    pub const WAVE_SOURCE: usize = 344;
}

/// Length of the short buffer prefix quoted in framing diagnostics
const DIAG_PREFIX_LEN: usize = 12;

/// Byte order declared by the COMM_ORDER tag (1 = little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn from_tag(tag: u8) -> Self {
        if tag == 1 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    fn i16(self, bytes: [u8; 2]) -> i16 {
        match self {
            ByteOrder::Little => i16::from_le_bytes(bytes),
            ByteOrder::Big => i16::from_be_bytes(bytes),
        }
    }

    fn i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::Little => i32::from_le_bytes(bytes),
            ByteOrder::Big => i32::from_be_bytes(bytes),
        }
    }

    fn f32(self, bytes: [u8; 4]) -> f32 {
        match self {
            ByteOrder::Little => f32::from_le_bytes(bytes),
            ByteOrder::Big => f32::from_be_bytes(bytes),
        }
    }

    fn f64(self, bytes: [u8; 8]) -> f64 {
        match self {
            ByteOrder::Little => f64::from_le_bytes(bytes),
            ByteOrder::Big => f64::from_be_bytes(bytes),
        }
    }
}

/// Sample encoding declared by the COMM_TYPE tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleFormat {
    /// 8-bit signed samples (COMM_TYPE 0)
    I8,
    /// 16-bit signed samples (COMM_TYPE 1)
    I16,
}

impl SampleFormat {
    fn from_tag(tag: u8) -> DecodeResult<Self> {
        match tag {
            0 => Ok(SampleFormat::I8),
            1 => Ok(SampleFormat::I16),
            other => Err(DecodeError::UnsupportedEncoding(other)),
        }
    }
}

/// Bounds-checked fixed-offset reads over the descriptor block
struct BlockReader<'a> {
    block: &'a [u8],
    order: ByteOrder,
}

impl<'a> BlockReader<'a> {
    fn new(block: &'a [u8], order: ByteOrder) -> Self {
        Self { block, order }
    }

    fn bytes(&self, offset: usize, width: usize, field: &str) -> DecodeResult<&'a [u8]> {
        self.block.get(offset..offset + width).ok_or_else(|| {
            DecodeError::insufficient(
                format!("descriptor field {field}"),
                offset + width,
                self.block.len(),
            )
        })
    }

    fn u8(&self, offset: usize, field: &str) -> DecodeResult<u8> {
        Ok(self.bytes(offset, 1, field)?[0])
    }

    fn i32(&self, offset: usize, field: &str) -> DecodeResult<i32> {
        let bytes = self.bytes(offset, 4, field)?;
        Ok(self.order.i32(bytes.try_into().unwrap()))
    }

    fn f32(&self, offset: usize, field: &str) -> DecodeResult<f32> {
        let bytes = self.bytes(offset, 4, field)?;
        Ok(self.order.f32(bytes.try_into().unwrap()))
    }

    fn f64(&self, offset: usize, field: &str) -> DecodeResult<f64> {
        let bytes = self.bytes(offset, 8, field)?;
        Ok(self.order.f64(bytes.try_into().unwrap()))
    }
}

/// Locate the self-delimited block inside a raw response
///
/// Returns the block payload (everything after the length digits) together
/// with its declared byte length. The payload may be longer than the declared
/// length; the instrument appends a terminator after the block.
fn frame_block(raw: &[u8]) -> DecodeResult<(&[u8], usize)> {
    let marker = raw
        .iter()
        .position(|&b| b == b'#')
        .ok_or_else(|| DecodeError::format("no block marker '#' in buffer"))?;
    let block = &raw[marker..];

    let digit_count = block
        .get(1)
        .and_then(|&b| (b as char).to_digit(10))
        .ok_or_else(|| DecodeError::format("block length digit count is not an ASCII digit"))?
        as usize;

    let digits = block
        .get(2..2 + digit_count)
        .ok_or_else(|| DecodeError::format("truncated block length digits"))?;
    let declared_len: usize = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DecodeError::format("malformed block length digits"))?;

    let payload = &block[2 + digit_count..];
    if payload.len() < declared_len {
        let prefix = block[..block.len().min(DIAG_PREFIX_LEN)]
            .escape_ascii()
            .to_string();
        return Err(DecodeError::insufficient(
            format!("waveform block (starts {prefix})"),
            declared_len,
            payload.len(),
        ));
    }

    Ok((payload, declared_len))
}

/// Decode a complete raw waveform response
pub(crate) fn decode(raw: &[u8]) -> DecodeResult<Waveform> {
    let (block, _declared_len) = frame_block(raw)?;

    // Origin tag sits in the two bytes at the start of the raw buffer,
    // before any command echo or block marker. Resolve it before touching
    // the descriptor so an unsupported channel fails fast.
    let tag = String::from_utf8_lossy(&raw[..raw.len().min(2)]).into_owned();
    let origin = Origin::parse(&tag)?;

    // The two single-byte tags are order-independent and come first: the
    // encoding tag decides the sample width, COMM_ORDER decides how every
    // other multi-byte field is read.
    let untyped = BlockReader::new(block, ByteOrder::Big);
    let format = SampleFormat::from_tag(untyped.u8(offsets::COMM_TYPE, "COMM_TYPE")?)?;
    let order = ByteOrder::from_tag(untyped.u8(offsets::COMM_ORDER, "COMM_ORDER")?);

    let reader = BlockReader::new(block, order);
    let wave_descriptor = reader.i32(offsets::WAVE_DESCRIPTOR, "WAVE_DESCRIPTOR")?;
    let user_text = reader.i32(offsets::USER_TEXT, "USER_TEXT")?;
    let res_desc = reader.i32(offsets::RES_DESC1, "RES_DESC1")?;
    let trigtime_array = reader.i32(offsets::TRIGTIME_ARRAY, "TRIGTIME_ARRAY")?;
    let ris_time_array = reader.i32(offsets::RIS_TIME_ARRAY, "RIS_TIME_ARRAY")?;
    let res_array = reader.i32(offsets::RES_ARRAY1, "RES_ARRAY1")?;
    let wave_array_len = reader.i32(offsets::WAVE_ARRAY_1, "WAVE_ARRAY_1")?;
    let declared_size = reader.i32(offsets::WAVE_ARRAY_COUNT, "WAVE_ARRAY_COUNT")?;
    let y_gain = reader.f32(offsets::VERTICAL_GAIN, "VERTICAL_GAIN")?;
    let y_offset = reader.f32(offsets::VERTICAL_OFFSET, "VERTICAL_OFFSET")?;
    let x_gain = reader.f32(offsets::HORIZ_INTERVAL, "HORIZ_INTERVAL")?;
    let x_offset = reader.f64(offsets::HORIZ_OFFSET, "HORIZ_OFFSET")?;
    let y_unit = reader.u8(offsets::VERTUNIT, "VERTUNIT")? as char;
    let x_unit = reader.u8(offsets::HORUNIT, "HORUNIT")? as char;
    let source = reader.u8(offsets::WAVE_SOURCE, "WAVE_SOURCE")?;

    // The sample array starts after every section the descriptor declares.
    // Lengths are signed on the wire; sum in 64-bit so corrupt descriptors
    // surface as a bounds error instead of wrapping.
    let start: i64 = [
        wave_descriptor,
        user_text,
        res_desc,
        trigtime_array,
        ris_time_array,
        res_array,
    ]
    .iter()
    .map(|&v| v as i64)
    .sum();
    let end = start + wave_array_len as i64;
    if start < 0 || wave_array_len < 0 || end > block.len() as i64 {
        return Err(DecodeError::insufficient(
            "sample array",
            end.max(0) as usize,
            block.len(),
        ));
    }
    let array = &block[start as usize..end as usize];

    let samples: Vec<f32> = match format {
        SampleFormat::I8 => array
            .iter()
            .map(|&b| (b as i8) as f32 * y_gain - y_offset)
            .collect(),
        SampleFormat::I16 => array
            .chunks_exact(2)
            .map(|pair| order.i16(pair.try_into().unwrap()) as f32 * y_gain - y_offset)
            .collect(),
    };

    let time: Vec<f32> = (0..samples.len())
        .map(|i| (i as f64 * x_gain as f64 - x_offset) as f32)
        .collect();

    Ok(Waveform {
        origin,
        y_gain,
        y_offset,
        y_unit,
        x_gain,
        x_offset,
        x_unit,
        declared_size,
        source,
        samples,
        time,
    })
}
