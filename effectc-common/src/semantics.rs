use std::fmt::{Display, Formatter};

/// The meaning of a shader stage input or output.
///
/// The discriminant is the byte written into packaged vertex input layouts.
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DataSemantics {
    Position = 0,
    Color0 = 1,
    Color1 = 2,
    Color2 = 3,
    Color3 = 4,
    Normal = 5,
    TexCoord0 = 6,
    TexCoord1 = 7,
    TexCoord2 = 8,
    TexCoord3 = 9,
}

impl DataSemantics {
    /// The largest index an indexed semantics attribute may carry.
    pub const MAX_INDEX: u32 = 3;

    /// The attribute names that declare a semantics.
    pub const ATTRIBUTE_NAMES: [&'static str; 4] = ["Position", "Color", "Normal", "TexCoord"];

    /// Resolve a semantics attribute and its index.
    ///
    /// `Position` and `Normal` only accept index 0.
    pub const fn from_attribute(name: &str, index: u32) -> Option<Self> {
        // const fn can't match on &str, compare bytes instead.
        let name = name.as_bytes();
        if bytes_eq(name, b"Position") {
            return if index == 0 { Some(Self::Position) } else { None };
        }
        if bytes_eq(name, b"Normal") {
            return if index == 0 { Some(Self::Normal) } else { None };
        }
        if bytes_eq(name, b"Color") {
            return match index {
                0 => Some(Self::Color0),
                1 => Some(Self::Color1),
                2 => Some(Self::Color2),
                3 => Some(Self::Color3),
                _ => None,
            };
        }
        if bytes_eq(name, b"TexCoord") {
            return match index {
                0 => Some(Self::TexCoord0),
                1 => Some(Self::TexCoord1),
                2 => Some(Self::TexCoord2),
                3 => Some(Self::TexCoord3),
                _ => None,
            };
        }
        None
    }

    /// Whether the name is one of the semantics attributes.
    pub fn is_attribute_name(name: &str) -> bool {
        Self::ATTRIBUTE_NAMES.contains(&name)
    }

    /// Get the semantics from its packaged byte value.
    pub const fn from_repr(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Position),
            1 => Some(Self::Color0),
            2 => Some(Self::Color1),
            3 => Some(Self::Color2),
            4 => Some(Self::Color3),
            5 => Some(Self::Normal),
            6 => Some(Self::TexCoord0),
            7 => Some(Self::TexCoord1),
            8 => Some(Self::TexCoord2),
            9 => Some(Self::TexCoord3),
            _ => None,
        }
    }

    pub const fn is_color(&self) -> bool {
        matches!(
            self,
            DataSemantics::Color0 | DataSemantics::Color1 | DataSemantics::Color2 | DataSemantics::Color3
        )
    }

    /// The index of an indexed semantics, 0 otherwise.
    pub const fn index(&self) -> u32 {
        match self {
            DataSemantics::Position | DataSemantics::Normal => 0,
            DataSemantics::Color0 | DataSemantics::TexCoord0 => 0,
            DataSemantics::Color1 | DataSemantics::TexCoord1 => 1,
            DataSemantics::Color2 | DataSemantics::TexCoord2 => 2,
            DataSemantics::Color3 | DataSemantics::TexCoord3 => 3,
        }
    }

    /// The display name, as written in diagnostics.
    pub const fn display_name(&self) -> &'static str {
        match self {
            DataSemantics::Position => "Position",
            DataSemantics::Color0 => "Color0",
            DataSemantics::Color1 => "Color1",
            DataSemantics::Color2 => "Color2",
            DataSemantics::Color3 => "Color3",
            DataSemantics::Normal => "Normal",
            DataSemantics::TexCoord0 => "TexCoord0",
            DataSemantics::TexCoord1 => "TexCoord1",
            DataSemantics::TexCoord2 => "TexCoord2",
            DataSemantics::TexCoord3 => "TexCoord3",
        }
    }

    /// The HLSL semantic name.
    ///
    /// System-value semantics (`SV_Position`, `SV_Target`) are chosen by the HLSL backend
    /// depending on stage and direction, this is the plain input semantic.
    pub const fn hlsl_name(&self) -> &'static str {
        match self {
            DataSemantics::Position => "POSITION",
            DataSemantics::Color0 => "COLOR0",
            DataSemantics::Color1 => "COLOR1",
            DataSemantics::Color2 => "COLOR2",
            DataSemantics::Color3 => "COLOR3",
            DataSemantics::Normal => "NORMAL",
            DataSemantics::TexCoord0 => "TEXCOORD0",
            DataSemantics::TexCoord1 => "TEXCOORD1",
            DataSemantics::TexCoord2 => "TEXCOORD2",
            DataSemantics::TexCoord3 => "TEXCOORD3",
        }
    }

    /// The suffix of GLSL global variables bound to this semantics.
    pub const fn glsl_name(&self) -> &'static str {
        match self {
            DataSemantics::Position => "position",
            DataSemantics::Color0 => "color0",
            DataSemantics::Color1 => "color1",
            DataSemantics::Color2 => "color2",
            DataSemantics::Color3 => "color3",
            DataSemantics::Normal => "normal",
            DataSemantics::TexCoord0 => "texcoord0",
            DataSemantics::TexCoord1 => "texcoord1",
            DataSemantics::TexCoord2 => "texcoord2",
            DataSemantics::TexCoord3 => "texcoord3",
        }
    }
}

impl Display for DataSemantics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

const fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod test {
    use crate::DataSemantics;

    #[test]
    fn resolves_indexed_attributes() {
        assert_eq!(
            DataSemantics::from_attribute("TexCoord", 2),
            Some(DataSemantics::TexCoord2)
        );
        assert_eq!(DataSemantics::from_attribute("Color", 4), None);
        assert_eq!(DataSemantics::from_attribute("Position", 1), None);
        assert_eq!(DataSemantics::from_attribute("Tangent", 0), None);
    }

    #[test]
    fn repr_matches_packaged_values() {
        for value in 0..10u8 {
            let semantics = DataSemantics::from_repr(value).unwrap();
            assert_eq!(semantics as u8, value);
        }
        assert_eq!(DataSemantics::from_repr(10), None);
    }

    #[test]
    fn colors() {
        assert!(DataSemantics::Color3.is_color());
        assert!(!DataSemantics::Normal.is_color());
        assert_eq!(DataSemantics::Color3.index(), 3);
    }
}
