use super::FormatError;
use crate::internals::binreader::BinReader;

/// Size of one telemetry sample on the wire.
pub(crate) const POINT_WIRE_SIZE: usize = 14;

/// The byte that closes a line block's variable-length id prefix.
const DONE_FLAG_SENTINEL: u8 = 0x54;

/// One telemetry sample on a stroke.
///
/// `x`/`y` are in the document's coordinate system; the tablet's renderer
/// gives them meaning, the decoder does not. The single-byte channels are
/// raw sensor values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    /// Pen speed.
    pub speed: u8,
    /// Stroke width at this sample.
    pub width: u8,
    /// Pen tilt direction.
    pub direction: u8,
    /// Pen pressure.
    pub pressure: u8,
}

impl Point {
    /// Reads the 14-byte wire layout; offsets 9 and 11 are padding.
    fn new(reader: &mut BinReader<'_>) -> Result<Self, FormatError> {
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let speed = reader.read_u8()?;
        reader.skip(1)?;
        let width = reader.read_u8()?;
        reader.skip(1)?;
        let direction = reader.read_u8()?;
        let pressure = reader.read_u8()?;

        Ok(Self {
            x,
            y,
            speed,
            width,
            direction,
            pressure,
        })
    }
}

/// One pen stroke.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    /// Opaque pen code; the firmware assigns the values.
    pub pen_type: u32,
    /// Opaque color code.
    pub color: u32,
    pub brush_size: f32,
    /// Samples in stroke order. Empty for a stroke whose done flag is
    /// set, and possibly shorter than declared for a truncated block.
    pub points: Vec<Point>,
}

impl Line {
    /// Decodes one line block body.
    ///
    /// The prefix before the done flag (`0x1f` layer id, `0x2f` line id,
    /// `0x3f` last line id, `0x4f` id field) has no length prefix and is
    /// not interpreted; the first `0x54` byte is taken as the sentinel.
    /// A prefix field that itself contains `0x54` would misalign the
    /// read head here, and the `0x6c` check below is what catches it.
    pub(crate) fn new(reader: &mut BinReader<'_>) -> Result<Self, FormatError> {
        let sentinel = reader
            .rest()
            .iter()
            .position(|&byte| byte == DONE_FLAG_SENTINEL)
            .ok_or(FormatError::NoDoneFlag)?;
        reader.skip(sentinel + 1)?;

        let done_flag = reader.read_u32()?;
        if done_flag != 0 {
            // An empty stroke; nothing else follows.
            return Ok(Self::default());
        }

        reader.expect_magic(&[0x6c])?;
        let _len_block_0 = reader.read_u32()?;
        reader.expect_magic(&[0x03, 0x14])?;
        let pen_type = reader.read_u32()?;
        reader.expect_magic(&[0x24])?;
        let color = reader.read_u32()?;
        reader.expect_magic(&[0x38])?;
        reader.skip(4)?;
        let brush_size = reader.read_f32()?;
        reader.expect_magic(&[0x44])?;
        reader.skip(4)?;
        reader.expect_magic(&[0x5c])?;
        let len_point_array = reader.read_u32()?;

        let declared = len_point_array as usize / POINT_WIRE_SIZE;
        let mut points = Vec::with_capacity(declared.min(reader.remaining() / POINT_WIRE_SIZE));

        for _ in 0..declared {
            // A short tail truncates the list instead of failing.
            if reader.remaining() < POINT_WIRE_SIZE {
                break;
            }

            points.push(Point::new(reader)?);
        }

        Ok(Self {
            pen_type,
            color,
            brush_size,
            points,
        })
    }
}

/// A drawing layer: the strokes grouped under one layer-definition id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    /// The identifier of the layer, unique within its document.
    pub id: u32,
    /// Strokes in block-stream order.
    pub lines: Vec<Line>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::line_body;

    fn decode(body: &[u8]) -> Result<Line, FormatError> {
        Line::new(&mut BinReader::new(body))
    }

    fn sample_line() -> Line {
        Line {
            pen_type: 3,
            color: 0,
            brush_size: 2.0,
            points: vec![
                Point {
                    x: 1.0,
                    y: 2.0,
                    speed: 10,
                    width: 20,
                    direction: 30,
                    pressure: 40,
                },
                Point {
                    x: 3.0,
                    y: 4.0,
                    speed: 11,
                    width: 21,
                    direction: 31,
                    pressure: 41,
                },
            ],
        }
    }

    #[test]
    fn stroke_fields_and_points_decode() -> eyre::Result<()> {
        let line = decode(&line_body(&sample_line()))?;

        assert_eq!(line, sample_line());

        Ok(())
    }

    #[test]
    fn nonzero_done_flag_means_empty_stroke() -> eyre::Result<()> {
        let line = decode(&line_body(&Line::default()))?;

        assert_eq!(line, Line::default());
        assert_eq!(line.pen_type, 0);
        assert_eq!(line.brush_size, 0.0);
        assert!(line.points.is_empty());

        Ok(())
    }

    #[test]
    fn missing_sentinel_is_an_error() {
        assert_eq!(decode(&[0x1f, 0x00, 0x2f]), Err(FormatError::NoDoneFlag));
    }

    #[test]
    fn wrong_separator_reports_position() {
        let mut body = line_body(&sample_line());

        // Corrupt the 0x6c separator right after the done flag.
        let at = body.iter().position(|&b| b == 0x6c).unwrap();
        body[at] = 0x6d;

        assert_eq!(
            decode(&body),
            Err(FormatError::BadMagic {
                at,
                expected: 0x6c,
                got: 0x6d,
            })
        );
    }

    #[test]
    fn truncated_point_array_keeps_whole_points() -> eyre::Result<()> {
        let body = line_body(&sample_line());

        // Chop mid-way through the second point; only the first survives.
        let line = decode(&body[..body.len() - 8])?;

        assert_eq!(line.points.len(), 1);
        assert_eq!(line.points[0], sample_line().points[0]);

        Ok(())
    }

    #[test]
    fn declared_length_bounds_the_point_count() -> eyre::Result<()> {
        let mut body = line_body(&sample_line());

        // Rewrite len_point_array to declare a single point; the second
        // one stays in the buffer but must not be read.
        let at = body.iter().position(|&b| b == 0x5c).unwrap() + 1;
        body[at..at + 4].copy_from_slice(&u32::to_le_bytes(POINT_WIRE_SIZE as u32));

        let line = decode(&body)?;

        assert_eq!(line.points.len(), 1);

        Ok(())
    }
}
