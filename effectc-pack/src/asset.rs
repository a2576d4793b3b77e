//! The binary shader asset format.
//!
//! One asset is written per shader method. Vertex shader assets start with the vertex input
//! layout, a `u8` element count followed by one `(format, semantics)` byte pair per input
//! parameter. Both stages then carry two sources, each prefixed with its length in bytes as
//! a little endian `u32`. The HLSL source comes first, then the GLSL source.

use crate::error::PackError;
use byteorder::{ByteOrder, LittleEndian};
use effectc_common::{DataSemantics, ShaderType, VertexElementFormat};
use effectc_reflect::reflect::ShaderMethod;
use std::path::Path;

/// One element of a vertex input layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexElement {
    pub format: VertexElementFormat,
    pub semantics: DataSemantics,
}

impl VertexElement {
    /// The input layout of a vertex shader method, in parameter order.
    pub fn layout_of(method: &ShaderMethod) -> Result<Vec<VertexElement>, PackError> {
        method
            .inputs()
            .map(|parameter| {
                let format = VertexElementFormat::from_data_type(parameter.ty).ok_or_else(|| {
                    PackError::VertexInput {
                        method: method.name.clone(),
                        parameter: parameter.name.clone(),
                    }
                })?;
                Ok(VertexElement {
                    format,
                    semantics: parameter.semantics,
                })
            })
            .collect()
    }
}

/// The file name of the asset of a shader method.
pub fn asset_file_name(effect: &str, method: &str, stage: ShaderType) -> String {
    format!("{effect}_{method}.{}.bin", stage.file_suffix())
}

/// A packaged shader method.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderAsset {
    pub stage: ShaderType,
    /// The vertex input layout. Always empty for fragment shaders.
    pub inputs: Vec<VertexElement>,
    pub hlsl: String,
    pub glsl: String,
}

impl ShaderAsset {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackError> {
        let mut bytes =
            Vec::with_capacity(1 + self.inputs.len() * 2 + 8 + self.hlsl.len() + self.glsl.len());

        if self.stage == ShaderType::Vertex {
            let count =
                u8::try_from(self.inputs.len()).map_err(|_| PackError::Overflow("input count"))?;
            bytes.push(count);
            for element in &self.inputs {
                bytes.push(element.format as u8);
                bytes.push(element.semantics as u8);
            }
        }

        for source in [&self.hlsl, &self.glsl] {
            let length =
                u32::try_from(source.len()).map_err(|_| PackError::Overflow("source length"))?;
            let mut prefix = [0; 4];
            LittleEndian::write_u32(&mut prefix, length);
            bytes.extend_from_slice(&prefix);
            bytes.extend_from_slice(source.as_bytes());
        }

        Ok(bytes)
    }

    /// Read an asset back. The stage decides whether a vertex input layout is expected.
    pub fn from_bytes(bytes: &[u8], stage: ShaderType) -> Result<ShaderAsset, PackError> {
        let mut reader = Reader { bytes };

        let mut inputs = Vec::new();
        if stage == ShaderType::Vertex {
            let count = reader.take(1)?[0];
            for _ in 0..count {
                let pair = reader.take(2)?;
                let format = VertexElementFormat::from_repr(pair[0])
                    .ok_or(PackError::InvalidFormat(pair[0]))?;
                let semantics = DataSemantics::from_repr(pair[1])
                    .ok_or(PackError::InvalidSemantics(pair[1]))?;
                inputs.push(VertexElement { format, semantics });
            }
        }

        let hlsl = reader.source()?;
        let glsl = reader.source()?;

        Ok(ShaderAsset {
            stage,
            inputs,
            hlsl,
            glsl,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), PackError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| PackError::Io(path.to_path_buf(), e))
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8], PackError> {
        if self.bytes.len() < count {
            return Err(PackError::UnexpectedEof);
        }
        let (head, tail) = self.bytes.split_at(count);
        self.bytes = tail;
        Ok(head)
    }

    fn source(&mut self) -> Result<String, PackError> {
        let length = LittleEndian::read_u32(self.take(4)?) as usize;
        let bytes = self.take(length)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vertex_asset() -> ShaderAsset {
        ShaderAsset {
            stage: ShaderType::Vertex,
            inputs: vec![
                VertexElement {
                    format: VertexElementFormat::Vector4,
                    semantics: DataSemantics::Position,
                },
                VertexElement {
                    format: VertexElementFormat::Vector2,
                    semantics: DataSemantics::TexCoord0,
                },
            ],
            hlsl: "hlsl".to_string(),
            glsl: "glsl!".to_string(),
        }
    }

    #[test]
    fn vertex_layout() {
        let bytes = vertex_asset().to_bytes().unwrap();
        assert_eq!(&bytes[..5], &[2, 3, 0, 1, 6]);
        assert_eq!(&bytes[5..9], &[4, 0, 0, 0]);
        assert_eq!(&bytes[9..13], b"hlsl");
        assert_eq!(&bytes[13..17], &[5, 0, 0, 0]);
        assert_eq!(&bytes[17..], b"glsl!");
    }

    #[test]
    fn fragment_assets_have_no_input_layout() {
        let asset = ShaderAsset {
            stage: ShaderType::Fragment,
            inputs: vec![],
            hlsl: String::new(),
            glsl: "x".to_string(),
        };
        let bytes = asset.to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 1, 0, 0, 0, b'x']);
        assert_eq!(ShaderAsset::from_bytes(&bytes, ShaderType::Fragment).unwrap(), asset);
    }

    #[test]
    fn reads_back() {
        let asset = vertex_asset();
        let bytes = asset.to_bytes().unwrap();
        assert_eq!(ShaderAsset::from_bytes(&bytes, ShaderType::Vertex).unwrap(), asset);
    }

    #[test]
    fn truncated_assets() {
        let bytes = vertex_asset().to_bytes().unwrap();
        for length in [0, 2, 6, bytes.len() - 1] {
            assert!(matches!(
                ShaderAsset::from_bytes(&bytes[..length], ShaderType::Vertex),
                Err(PackError::UnexpectedEof)
            ));
        }
    }

    #[test]
    fn invalid_bytes() {
        assert!(matches!(
            ShaderAsset::from_bytes(&[1, 4, 0], ShaderType::Vertex),
            Err(PackError::InvalidFormat(4))
        ));
        assert!(matches!(
            ShaderAsset::from_bytes(&[1, 0, 10], ShaderType::Vertex),
            Err(PackError::InvalidSemantics(10))
        ));
        assert!(matches!(
            ShaderAsset::from_bytes(&[2, 0, 0, 0, 0xff, 0xfe, 0, 0, 0, 0], ShaderType::Fragment),
            Err(PackError::Utf8(_))
        ));
    }

    #[test]
    fn file_names() {
        assert_eq!(
            asset_file_name("Basic", "VertexMain", ShaderType::Vertex),
            "Basic_VertexMain.vs.bin"
        );
        assert_eq!(
            asset_file_name("Basic", "FragmentMain", ShaderType::Fragment),
            "Basic_FragmentMain.fs.bin"
        );
    }
}
