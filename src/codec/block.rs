// Record block model: composable fixed-layout records

use super::Result;

/// A fixed-layout memory record assembled from field codec primitives.
///
/// A block's size is fixed by the widest field extent declared in its
/// schema and never depends on field contents. Import is atomic: either
/// every declared field decodes or the whole import fails.
pub trait Block: Sized {
    /// Declared total length in bytes.
    const SIZE: usize;

    /// Length of the meaningful prefix shown to operators; everything
    /// beyond it is trailing unused space.
    const DUMP_LEN: usize = Self::SIZE;

    /// Fill byte for spans not covered by a declared field.
    const FILL: u8 = 0x00;

    /// Decode every declared field from the buffer.
    fn import_data(data: &[u8]) -> Result<Self>;

    /// Encode every declared field into a buffer of exactly `SIZE` bytes.
    fn export_data(&self) -> Result<Vec<u8>>;

    fn size(&self) -> usize {
        Self::SIZE
    }

    /// Hex rendering of the meaningful prefix only, so operators are not
    /// shown pages of trailing padding.
    fn hexdump(&self) -> Result<String> {
        let data = self.export_data()?;
        Ok(hexdump(&data[..Self::DUMP_LEN]))
    }
}

/// Create a hex dump of bytes (similar to hexdump -C)
pub fn hexdump(data: &[u8]) -> String {
    let mut output = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        output.push_str(&format!("{:08x}  ", i * 16));

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                output.push(' ');
            }
            output.push_str(&format!("{:02x} ", byte));
        }

        if chunk.len() < 16 {
            for j in chunk.len()..16 {
                if j == 8 {
                    output.push(' ');
                }
                output.push_str("   ");
            }
        }

        output.push_str(" |");
        for byte in chunk {
            if *byte >= 0x20 && *byte <= 0x7e {
                output.push(*byte as char);
            } else {
                output.push('.');
            }
        }
        output.push_str("|\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, UInt8Field};

    struct Sample {
        value: u8,
    }

    impl Sample {
        const VALUE: UInt8Field = UInt8Field::new(0);
    }

    impl Block for Sample {
        const SIZE: usize = 8;
        const DUMP_LEN: usize = 4;
        const FILL: u8 = 0xEE;

        fn import_data(data: &[u8]) -> Result<Self> {
            if data.len() < Self::SIZE {
                return Err(CodecError::TruncatedInput {
                    needed: Self::SIZE,
                    available: data.len(),
                });
            }
            Ok(Self {
                value: Self::VALUE.decode(data)?,
            })
        }

        fn export_data(&self) -> Result<Vec<u8>> {
            let mut data = vec![Self::FILL; Self::SIZE];
            Self::VALUE.encode(&mut data, self.value)?;
            Ok(data)
        }
    }

    #[test]
    fn test_export_uses_declared_fill() {
        let block = Sample { value: 0x42 };
        assert_eq!(block.export_data().unwrap(), vec![0x42, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE, 0xEE]);
    }

    #[test]
    fn test_size_is_schema_constant() {
        assert_eq!(Sample { value: 0 }.size(), 8);
        assert_eq!(Sample { value: 0xFF }.size(), 8);
    }

    #[test]
    fn test_hexdump_restricted_to_prefix() {
        let dump = Sample { value: 0x42 }.hexdump().unwrap();
        assert!(dump.contains("42 ee ee ee"));
        // one 4-byte line, no trailing-space bytes rendered
        assert_eq!(dump.lines().count(), 1);
    }

    #[test]
    fn test_hexdump_format() {
        let data = vec![
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f, 0x41, 0x42, 0x43,
        ];
        let dump = hexdump(&data);
        assert!(dump.contains("00 01 02 03"));
        assert!(dump.contains("|ABC"));
        assert!(dump.contains("00000010"));
    }
}
