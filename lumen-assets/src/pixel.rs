//! Texture targets, pixel formats and their byte sizes.
//!
//! Every enum maps 1:1 onto the OpenGL enumerant the renderer passes to
//! texture creation, and every member has a defined size: an unknown raw
//! value is rejected when it is parsed, never sized.

use crate::error::{AssetError, AssetResult};

macro_rules! gl_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $err:expr, {
            $($variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn to_raw(self) -> u32 {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            pub fn from_raw(raw: u32) -> AssetResult<Self> {
                match raw {
                    $(v if v == $value => Ok(Self::$variant),)+
                    other => Err($err(other)),
                }
            }
        }
    };
}

gl_enum! {
    /// Texture object target.
    TextureTarget, AssetError::UnsupportedTarget, {
        Texture1D = 0x0DE0,
        Texture2D = 0x0DE1,
        Texture3D = 0x806F,
        Texture1DArray = 0x8C18,
        Texture2DArray = 0x8C1A,
        CubeMap = 0x8513,
        CubeMapArray = 0x9009,
        Texture2DMultisample = 0x9100,
        Texture2DMultisampleArray = 0x9102,
    }
}

impl TextureTarget {
    pub fn is_multisample(self) -> bool {
        matches!(
            self,
            Self::Texture2DMultisample | Self::Texture2DMultisampleArray
        )
    }

    /// Number of slices stored per mip level for a level of the given size.
    ///
    /// Zero for targets that are not array-like.
    pub fn slice_count(self, height: u32, depth: u32) -> u32 {
        match self {
            Self::Texture1DArray => height,
            Self::Texture2DArray | Self::CubeMapArray | Self::Texture2DMultisampleArray => depth,
            Self::CubeMap => 6,
            Self::Texture1D | Self::Texture2D | Self::Texture3D | Self::Texture2DMultisample => 0,
        }
    }

    /// Factor between a level's raw size from its dimensions and the bytes
    /// actually stored for it.
    pub(crate) fn face_factor(self) -> u64 {
        match self {
            Self::CubeMap => 6,
            _ => 1,
        }
    }
}

gl_enum! {
    /// Channel layout of pixel data as stored and transferred.
    ExternalFormat, AssetError::UnsupportedFormat, {
        StencilIndex = 0x1901,
        DepthComponent = 0x1902,
        Red = 0x1903,
        Green = 0x1904,
        Blue = 0x1905,
        Alpha = 0x1906,
        Rgb = 0x1907,
        Rgba = 0x1908,
        Bgr = 0x80E0,
        Bgra = 0x80E1,
        Rg = 0x8227,
        RgInteger = 0x8228,
        DepthStencil = 0x84F9,
        RedInteger = 0x8D94,
        GreenInteger = 0x8D95,
        BlueInteger = 0x8D96,
        RgbInteger = 0x8D98,
        RgbaInteger = 0x8D99,
        BgrInteger = 0x8D9A,
        BgraInteger = 0x8D9B,
    }
}

impl ExternalFormat {
    pub fn channel_count(self) -> u32 {
        match self {
            Self::StencilIndex
            | Self::DepthComponent
            | Self::Red
            | Self::Green
            | Self::Blue
            | Self::Alpha
            | Self::RedInteger
            | Self::GreenInteger
            | Self::BlueInteger => 1,
            Self::Rg | Self::RgInteger | Self::DepthStencil => 2,
            Self::Rgb | Self::Bgr | Self::RgbInteger | Self::BgrInteger => 3,
            Self::Rgba | Self::Bgra | Self::RgbaInteger | Self::BgraInteger => 4,
        }
    }
}

gl_enum! {
    /// Component type of external pixel data.
    ///
    /// Includes the vector and matrix types so any uniform-style type the
    /// renderer reports can be sized, and the packed types whose size covers
    /// a whole pixel.
    ComponentType, AssetError::UnsupportedComponentType, {
        Byte = 0x1400,
        UnsignedByte = 0x1401,
        Short = 0x1402,
        UnsignedShort = 0x1403,
        Int = 0x1404,
        UnsignedInt = 0x1405,
        Float = 0x1406,
        Double = 0x140A,
        HalfFloat = 0x140B,
        FloatVec2 = 0x8B50,
        FloatVec3 = 0x8B51,
        FloatVec4 = 0x8B52,
        IntVec2 = 0x8B53,
        IntVec3 = 0x8B54,
        IntVec4 = 0x8B55,
        Bool = 0x8B56,
        BoolVec2 = 0x8B57,
        BoolVec3 = 0x8B58,
        BoolVec4 = 0x8B59,
        FloatMat2 = 0x8B5A,
        FloatMat3 = 0x8B5B,
        FloatMat4 = 0x8B5C,
        FloatMat2x3 = 0x8B65,
        FloatMat2x4 = 0x8B66,
        FloatMat3x2 = 0x8B67,
        FloatMat3x4 = 0x8B68,
        FloatMat4x2 = 0x8B69,
        FloatMat4x3 = 0x8B6A,
        UnsignedIntVec2 = 0x8DC6,
        UnsignedIntVec3 = 0x8DC7,
        UnsignedIntVec4 = 0x8DC8,
        DoubleMat2 = 0x8F46,
        DoubleMat3 = 0x8F47,
        DoubleMat4 = 0x8F48,
        DoubleMat2x3 = 0x8F49,
        DoubleMat2x4 = 0x8F4A,
        DoubleMat3x2 = 0x8F4B,
        DoubleMat3x4 = 0x8F4C,
        DoubleMat4x2 = 0x8F4D,
        DoubleMat4x3 = 0x8F4E,
        DoubleVec2 = 0x8FFC,
        DoubleVec3 = 0x8FFD,
        DoubleVec4 = 0x8FFE,
        UnsignedByte332 = 0x8032,
        UnsignedShort4444 = 0x8033,
        UnsignedShort5551 = 0x8034,
        UnsignedInt8888 = 0x8035,
        UnsignedInt1010102 = 0x8036,
        UnsignedShort565 = 0x8363,
        UnsignedInt2101010Rev = 0x8368,
        UnsignedInt248 = 0x84FA,
        UnsignedInt10F11F11FRev = 0x8C3B,
        UnsignedInt5999Rev = 0x8C3E,
    }
}

impl ComponentType {
    /// Bytes per component, or per pixel for packed types.
    pub fn byte_size(self) -> u32 {
        use ComponentType::*;
        match self {
            Byte | UnsignedByte | UnsignedByte332 => 1,
            Short | UnsignedShort | HalfFloat | UnsignedShort4444 | UnsignedShort5551
            | UnsignedShort565 => 2,
            Int | UnsignedInt | Float | Bool | UnsignedInt8888 | UnsignedInt1010102
            | UnsignedInt2101010Rev | UnsignedInt248 | UnsignedInt10F11F11FRev
            | UnsignedInt5999Rev => 4,
            Double | FloatVec2 | IntVec2 | BoolVec2 | UnsignedIntVec2 => 8,
            FloatVec3 | IntVec3 | BoolVec3 | UnsignedIntVec3 => 12,
            FloatVec4 | IntVec4 | BoolVec4 | UnsignedIntVec4 | DoubleVec2 | FloatMat2 => 16,
            DoubleVec3 | FloatMat2x3 | FloatMat3x2 => 24,
            DoubleVec4 | FloatMat2x4 | FloatMat4x2 | DoubleMat2 => 32,
            FloatMat3 => 36,
            FloatMat3x4 | FloatMat4x3 | DoubleMat2x3 | DoubleMat3x2 => 48,
            FloatMat4 | DoubleMat2x4 | DoubleMat4x2 => 64,
            DoubleMat3 => 72,
            DoubleMat3x4 | DoubleMat4x3 => 96,
            DoubleMat4 => 128,
        }
    }

    /// Whether one value of this type encodes every channel of a pixel.
    pub fn is_packed(self) -> bool {
        use ComponentType::*;
        matches!(
            self,
            UnsignedByte332
                | UnsignedShort4444
                | UnsignedShort5551
                | UnsignedShort565
                | UnsignedInt8888
                | UnsignedInt1010102
                | UnsignedInt2101010Rev
                | UnsignedInt248
                | UnsignedInt10F11F11FRev
                | UnsignedInt5999Rev
        )
    }
}

/// Bytes per pixel of external data.
pub fn external_format_byte_size(format: ExternalFormat, component_type: ComponentType) -> u32 {
    if component_type.is_packed() {
        component_type.byte_size()
    } else {
        format.channel_count() * component_type.byte_size()
    }
}

gl_enum! {
    /// GPU-side storage format requested at texture creation.
    InternalFormat, AssetError::UnsupportedFormat, {
        R8 = 0x8229,
        R16 = 0x822A,
        Rg8 = 0x822B,
        Rg16 = 0x822C,
        R16F = 0x822D,
        R32F = 0x822E,
        Rg16F = 0x822F,
        Rg32F = 0x8230,
        R8I = 0x8231,
        R8UI = 0x8232,
        R16I = 0x8233,
        R16UI = 0x8234,
        R32I = 0x8235,
        R32UI = 0x8236,
        Rg8I = 0x8237,
        Rg8UI = 0x8238,
        Rg16I = 0x8239,
        Rg16UI = 0x823A,
        Rg32I = 0x823B,
        Rg32UI = 0x823C,
        Rgb8 = 0x8051,
        Rgb16 = 0x8054,
        Rgba4 = 0x8056,
        Rgb5A1 = 0x8057,
        Rgba8 = 0x8058,
        Rgb10A2 = 0x8059,
        Rgba16 = 0x805B,
        Rgb565 = 0x8D62,
        Srgb8 = 0x8C41,
        Srgb8Alpha8 = 0x8C43,
        Rgba32F = 0x8814,
        Rgb32F = 0x8815,
        Rgba16F = 0x881A,
        Rgb16F = 0x881B,
        R11FG11FB10F = 0x8C3A,
        Rgb9E5 = 0x8C3D,
        Rgba32UI = 0x8D70,
        Rgb32UI = 0x8D71,
        Rgba16UI = 0x8D76,
        Rgb16UI = 0x8D77,
        Rgba8UI = 0x8D7C,
        Rgb8UI = 0x8D7D,
        Rgba32I = 0x8D82,
        Rgb32I = 0x8D83,
        Rgba16I = 0x8D88,
        Rgb16I = 0x8D89,
        Rgba8I = 0x8D8E,
        Rgb8I = 0x8D8F,
        DepthComponent16 = 0x81A5,
        DepthComponent24 = 0x81A6,
        DepthComponent32 = 0x81A7,
        DepthComponent32F = 0x8CAC,
        Depth24Stencil8 = 0x88F0,
        Depth32FStencil8 = 0x8CAD,
        StencilIndex8 = 0x8D48,
    }
}

impl InternalFormat {
    pub fn channel_count(self) -> u32 {
        use InternalFormat::*;
        match self {
            R8 | R16 | R16F | R32F | R8I | R8UI | R16I | R16UI | R32I | R32UI
            | DepthComponent16 | DepthComponent24 | DepthComponent32 | DepthComponent32F
            | StencilIndex8 => 1,
            Rg8 | Rg16 | Rg16F | Rg32F | Rg8I | Rg8UI | Rg16I | Rg16UI | Rg32I | Rg32UI
            | Depth24Stencil8 | Depth32FStencil8 => 2,
            Rgb8 | Rgb16 | Rgb565 | Srgb8 | Rgb32F | Rgb16F | R11FG11FB10F | Rgb9E5
            | Rgb32UI | Rgb16UI | Rgb8UI | Rgb32I | Rgb16I | Rgb8I => 3,
            Rgba4 | Rgb5A1 | Rgba8 | Rgb10A2 | Rgba16 | Srgb8Alpha8 | Rgba32F | Rgba16F
            | Rgba32UI | Rgba16UI | Rgba8UI | Rgba32I | Rgba16I | Rgba8I => 4,
        }
    }

    /// GPU storage bytes per texel.
    pub fn byte_size(self) -> u32 {
        use InternalFormat::*;
        match self {
            R8 | R8I | R8UI | StencilIndex8 => 1,
            R16 | R16F | R16I | R16UI | Rg8 | Rg8I | Rg8UI | Rgba4 | Rgb5A1 | Rgb565
            | DepthComponent16 => 2,
            Rgb8 | Srgb8 | Rgb8UI | Rgb8I | DepthComponent24 => 3,
            R32F | R32I | R32UI | Rg16 | Rg16F | Rg16I | Rg16UI | Rgba8 | Srgb8Alpha8
            | Rgb10A2 | R11FG11FB10F | Rgb9E5 | Rgba8UI | Rgba8I | DepthComponent32
            | DepthComponent32F | Depth24Stencil8 => 4,
            Rgb16 | Rgb16F | Rgb16UI | Rgb16I => 6,
            Rg32F | Rg32I | Rg32UI | Rgba16 | Rgba16F | Rgba16UI | Rgba16I
            | Depth32FStencil8 => 8,
            Rgb32F | Rgb32UI | Rgb32I => 12,
            Rgba32F | Rgba32UI | Rgba32I => 16,
        }
    }
}

gl_enum! {
    /// Source of one channel of a texture swizzle.
    Swizzle, |raw| AssetError::invalid(format!("unknown swizzle source {raw:#06x}")), {
        Zero = 0,
        One = 1,
        Red = 0x1903,
        Green = 0x1904,
        Blue = 0x1905,
        Alpha = 0x1906,
    }
}

/// Swizzle that leaves every channel in place.
pub const IDENTITY_SWIZZLE: [Swizzle; 4] = [Swizzle::Red, Swizzle::Green, Swizzle::Blue, Swizzle::Alpha];
