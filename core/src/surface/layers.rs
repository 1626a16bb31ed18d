use serde::{Deserialize, Serialize};

/// Base tile layer shown under the detection overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BaseLayer {
    #[default]
    OpenStreetMap,
    Satellite,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 2] = [BaseLayer::OpenStreetMap, BaseLayer::Satellite];

    pub fn tile_url(&self) -> &'static str {
        match self {
            BaseLayer::OpenStreetMap => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            BaseLayer::Satellite => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            BaseLayer::OpenStreetMap => "© OpenStreetMap contributors",
            BaseLayer::Satellite => "Tiles © Esri",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            BaseLayer::OpenStreetMap => BaseLayer::Satellite,
            BaseLayer::Satellite => BaseLayer::OpenStreetMap,
        }
    }
}

impl std::fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseLayer::OpenStreetMap => f.write_str("OpenStreetMap"),
            BaseLayer::Satellite => f.write_str("Satellite"),
        }
    }
}
