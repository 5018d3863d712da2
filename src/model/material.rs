//! Material extension types

/// Color in RGBA order (red, green, blue, alpha)
pub type Rgba = (u8, u8, u8, u8);

/// Color used when a malformed color is recovered in non-strict mode
pub const DEFAULT_COLOR: Rgba = (255, 255, 255, 255);

/// Base material entry with a display color
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterial {
    /// Material name
    pub name: String,
    /// Display color
    pub displaycolor: Rgba,
}

impl BaseMaterial {
    /// Create a new base material
    pub fn new(name: impl Into<String>, displaycolor: Rgba) -> Self {
        Self {
            name: name.into(),
            displaycolor,
        }
    }
}

/// Base material group of the 3MF core (`<basematerials>`)
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterialGroup {
    /// Resource ID
    pub id: usize,
    /// Materials in document order
    pub materials: Vec<BaseMaterial>,
}

impl BaseMaterialGroup {
    /// Create a new empty group
    pub fn new(id: usize) -> Self {
        Self {
            id,
            materials: Vec::new(),
        }
    }
}

/// Color group from materials extension
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup {
    /// Resource ID
    pub id: usize,
    /// Colors in document order
    pub colors: Vec<Rgba>,
}

impl ColorGroup {
    /// Create a new empty color group
    pub fn new(id: usize) -> Self {
        Self {
            id,
            colors: Vec::new(),
        }
    }
}

/// Texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tex2Coord {
    /// U coordinate
    pub u: f64,
    /// V coordinate
    pub v: f64,
}

impl Tex2Coord {
    /// Create a new texture coordinate
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// Texture coordinate group from materials extension
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2DGroup {
    /// Resource ID
    pub id: usize,
    /// ID of the texture2d resource the coordinates sample
    pub texid: usize,
    /// Coordinates in document order
    pub tex2coords: Vec<Tex2Coord>,
}

impl Texture2DGroup {
    /// Create a new empty group
    pub fn new(id: usize, texid: usize) -> Self {
        Self {
            id,
            texid,
            tex2coords: Vec::new(),
        }
    }
}

/// Texture tiling style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileStyle {
    /// Repeat the texture
    #[default]
    Wrap,
    /// Mirror the texture
    Mirror,
    /// Clamp to edge pixels
    Clamp,
    /// Transparent outside \[0,1\]
    None,
}

impl TileStyle {
    /// Parse the attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wrap" => Some(TileStyle::Wrap),
            "mirror" => Some(TileStyle::Mirror),
            "clamp" => Some(TileStyle::Clamp),
            "none" => Some(TileStyle::None),
            _ => None,
        }
    }
}

/// Texture filter mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Auto select best quality
    #[default]
    Auto,
    /// Bilinear interpolation
    Linear,
    /// Nearest neighbor
    Nearest,
}

impl FilterMode {
    /// Parse the attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(FilterMode::Auto),
            "linear" => Some(FilterMode::Linear),
            "nearest" => Some(FilterMode::Nearest),
            _ => None,
        }
    }
}

/// 2D texture resource from materials extension
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    /// Resource ID
    pub id: usize,
    /// Absolute path of the texture part
    pub path: String,
    /// Content type of the texture part (`image/png` or `image/jpeg`)
    pub contenttype: String,
    /// Tile style in u
    pub tilestyleu: TileStyle,
    /// Tile style in v
    pub tilestylev: TileStyle,
    /// Filter mode
    pub filter: FilterMode,
}

impl Texture2D {
    /// Create a texture with default tiling and filtering
    pub fn new(id: usize, path: impl Into<String>, contenttype: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            contenttype: contenttype.into(),
            tilestyleu: TileStyle::default(),
            tilestylev: TileStyle::default(),
            filter: FilterMode::default(),
        }
    }
}

/// The known kinds of per-triangle property data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceDataKind {
    /// Index into a base materials group
    BaseMaterial,
    /// One color per vertex from a color group
    Colors,
    /// One texture coordinate per vertex from a texture coordinate group
    TexCoords,
}

/// Resolved per-triangle property data
#[derive(Debug, Clone, PartialEq)]
pub enum FaceData {
    /// Base material index `index` of group `group`
    BaseMaterial {
        /// Base materials group id
        group: usize,
        /// Material index in the group
        index: usize,
    },
    /// Per-vertex colors
    Colors([Rgba; 3]),
    /// Per-vertex texture coordinates sampling texture `texid`
    TexCoords {
        /// Texture2D resource id
        texid: usize,
        /// Coordinates for v1, v2, v3
        coords: [Tex2Coord; 3],
    },
}

impl FaceData {
    /// Create default-initialized face data of the given kind
    pub fn new(kind: FaceDataKind) -> Self {
        match kind {
            FaceDataKind::BaseMaterial => FaceData::BaseMaterial { group: 0, index: 0 },
            FaceDataKind::Colors => FaceData::Colors([DEFAULT_COLOR; 3]),
            FaceDataKind::TexCoords => FaceData::TexCoords {
                texid: 0,
                coords: [Tex2Coord::new(0.0, 0.0); 3],
            },
        }
    }

    /// The kind tag of this value
    pub fn kind(&self) -> FaceDataKind {
        match self {
            FaceData::BaseMaterial { .. } => FaceDataKind::BaseMaterial,
            FaceData::Colors(_) => FaceDataKind::Colors,
            FaceData::TexCoords { .. } => FaceDataKind::TexCoords,
        }
    }
}
