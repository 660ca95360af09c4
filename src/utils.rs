pub(crate) mod tree {
    use crate::doc::layer::Layer;
    use std::fmt::{Display, Formatter, Result};

    /// Renders a document's layers the way a file browser draws a
    /// directory listing.
    pub(crate) struct LayerTree<'l>(&'l [Layer]);

    impl<'l> LayerTree<'l> {
        pub(crate) fn new(layers: &'l [Layer]) -> Self {
            Self(layers)
        }
    }

    impl Display for LayerTree<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            writeln!(f, ".")?;

            let Some((last, rest)) = self.0.split_last() else {
                return Ok(());
            };

            for layer in rest {
                branch(f, "├─ ", layer)?;
            }

            branch(f, "└─ ", last)
        }
    }

    fn branch(f: &mut Formatter<'_>, prefix: &str, layer: &Layer) -> Result {
        let strokes = layer.lines.len();
        let label = format!(
            "layer {} ({strokes} stroke{})",
            layer.id,
            if strokes == 1 { "" } else { "s" },
        );

        #[cfg(feature = "tree_view")]
        if f.alternate() && strokes == 0 {
            use colored::Colorize;

            return writeln!(f, "{prefix}{}", label.truecolor(100, 100, 100).italic());
        }

        writeln!(f, "{prefix}{label}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    //! Synthetic `.rm` fixtures, emitted byte-for-byte in the documented
    //! wire layout. [`rm_bytes`] doubles as the re-serialiser for the
    //! round-trip test.

    use crate::{
        block::MAGIC_HEADER,
        doc::{
            layer::{Line, POINT_WIRE_SIZE},
            Document,
        },
    };

    pub(crate) const TAG_LAYER_DEFINITION: u32 = 0x01010100;
    pub(crate) const TAG_LINE_DEFINITION: u32 = 0x05020200;

    /// Accumulates header, frontmatter and frames into an `.rm` buffer.
    pub(crate) struct SampleBuilder {
        bytes: Vec<u8>,
    }

    impl SampleBuilder {
        /// A version-'6' header followed by the 10 reserved bytes.
        pub(crate) fn new() -> Self {
            Self::with_version(b'6')
        }

        pub(crate) fn with_version(version: u8) -> Self {
            let mut bytes = Vec::with_capacity(64);
            bytes.extend_from_slice(MAGIC_HEADER);
            bytes.push(version);
            bytes.extend([0; 10]);

            Self { bytes }
        }

        /// Extra variable-length frontmatter before the first frame.
        pub(crate) fn frontmatter(mut self, extra: &[u8]) -> Self {
            self.bytes.extend_from_slice(extra);
            self
        }

        pub(crate) fn block(mut self, tag: u32, body: &[u8]) -> Self {
            self.bytes.extend((body.len() as u32).to_le_bytes());
            self.bytes.extend(tag.to_le_bytes());
            self.bytes.extend_from_slice(body);
            self
        }

        /// A layer-definition frame: the id plus four reserved bytes.
        pub(crate) fn layer(self, id: u32) -> Self {
            let mut body = id.to_le_bytes().to_vec();
            body.extend([0; 4]);

            self.block(TAG_LAYER_DEFINITION, &body)
        }

        pub(crate) fn line(self, line: &Line) -> Self {
            self.block(TAG_LINE_DEFINITION, &line_body(line))
        }

        /// Raw bytes appended after the last frame.
        pub(crate) fn trailing(mut self, bytes: &[u8]) -> Self {
            self.bytes.extend_from_slice(bytes);
            self
        }

        pub(crate) fn build(self) -> Vec<u8> {
            self.bytes
        }
    }

    /// Emits one line-block body.
    ///
    /// The id prefix is fixed and `0x54`-free, so the sentinel scan always
    /// lands on the done flag. A line equal to `Line::default()` is
    /// written as an empty stroke (non-zero done flag, nothing after it).
    pub(crate) fn line_body(line: &Line) -> Vec<u8> {
        let mut body = vec![0x1f, 0x00, 0x2f, 0x01, 0x3f, 0x00, 0x4f, 0x00, 0x00];
        body.push(0x54);

        if *line == Line::default() {
            body.extend(1u32.to_le_bytes());
            return body;
        }

        body.extend(0u32.to_le_bytes());
        body.push(0x6c);
        body.extend(0u32.to_le_bytes());
        body.extend([0x03, 0x14]);
        body.extend(line.pen_type.to_le_bytes());
        body.push(0x24);
        body.extend(line.color.to_le_bytes());
        body.push(0x38);
        body.extend([0; 4]);
        body.extend(line.brush_size.to_le_bytes());
        body.push(0x44);
        body.extend([0; 4]);
        body.push(0x5c);
        body.extend((line.points.len() as u32 * POINT_WIRE_SIZE as u32).to_le_bytes());

        for point in &line.points {
            body.extend(point.x.to_le_bytes());
            body.extend(point.y.to_le_bytes());
            body.extend([
                point.speed,
                0,
                point.width,
                0,
                point.direction,
                point.pressure,
            ]);
        }

        body
    }

    /// Re-serialises a decoded document back into `.rm` bytes.
    pub(crate) fn rm_bytes(document: &Document) -> Vec<u8> {
        let mut builder = SampleBuilder::with_version(document.version as u8);

        for layer in &document.layers {
            builder = builder.layer(layer.id);

            for line in &layer.lines {
                builder = builder.line(line);
            }
        }

        builder.build()
    }
}
