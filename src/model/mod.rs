//! Data structures representing decoded 3MF packages

mod core;
mod extension;
mod material;

pub use core::{
    AssetRef, Attachment, Build, BuildItem, ChildModel, Component, Mesh, MetadataEntry, Model,
    Object, ObjectType, Relationship, Resource, Resources, Triangle, Vertex,
};

pub use extension::{ExtensionAsset, ExtensionAttr, ExtensionData, ExtensionSpec};

pub use material::{
    BaseMaterial, BaseMaterialGroup, ColorGroup, DEFAULT_COLOR, FaceData, FaceDataKind,
    FilterMode, Rgba, Tex2Coord, Texture2D, Texture2DGroup, TileStyle,
};
