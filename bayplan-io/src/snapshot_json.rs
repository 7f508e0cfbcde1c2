use bayplan_core::catalog::CatalogCode;
use bayplan_core::snapshot::{Snapshot, TireRecord};
use bayplan_core::tire::TireId;
use serde::{Deserialize, Serialize};

use crate::IoError;

/// 未携带 `scaleFactor` 的快照按宽屏预设解释。
pub const DEFAULT_SCALE_FACTOR: f64 = 10.0;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    tires: Vec<WireTire>,
    #[serde(rename = "bayLengthMM")]
    bay_length_mm: u32,
    id_counter: u64,
    #[serde(default = "default_scale_factor")]
    scale_factor: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTire {
    id: String,
    x: f64,
    y: f64,
    #[serde(rename = "diameterMM")]
    diameter_mm: f64,
    #[serde(default)]
    catalog_code: String,
    in_bay: bool,
}

fn default_scale_factor() -> f64 {
    DEFAULT_SCALE_FACTOR
}

impl From<&TireRecord> for WireTire {
    fn from(record: &TireRecord) -> Self {
        Self {
            id: record.id.to_string(),
            x: record.x,
            y: record.y,
            diameter_mm: record.diameter_mm,
            catalog_code: record
                .catalog_code
                .as_ref()
                .map(|code| code.as_str().to_string())
                .unwrap_or_default(),
            in_bay: record.in_bay,
        }
    }
}

impl TryFrom<WireTire> for TireRecord {
    type Error = IoError;

    fn try_from(wire: WireTire) -> Result<Self, Self::Error> {
        let id = TireId::parse_label(&wire.id)
            .ok_or_else(|| IoError::InvalidSnapshot(format!("无法识别的轮胎 ID {:?}", wire.id)))?;
        if !(wire.diameter_mm.is_finite() && wire.diameter_mm > 0.0) {
            return Err(IoError::InvalidSnapshot(format!(
                "{id} 的直径 {} 无效",
                wire.diameter_mm
            )));
        }
        Ok(Self {
            id,
            x: wire.x,
            y: wire.y,
            diameter_mm: wire.diameter_mm,
            catalog_code: CatalogCode::parse(&wire.catalog_code),
            in_bay: wire.in_bay,
        })
    }
}

/// 编码为带缩进的 JSON。
pub fn encode(snapshot: &Snapshot) -> Result<String, IoError> {
    let wire = WireSnapshot {
        tires: snapshot.tires().iter().map(WireTire::from).collect(),
        bay_length_mm: snapshot.bay_length_mm(),
        id_counter: snapshot.id_counter(),
        scale_factor: snapshot.scale_factor(),
    };
    Ok(serde_json::to_string_pretty(&wire)?)
}

pub fn decode(source: &str) -> Result<Snapshot, IoError> {
    let wire: WireSnapshot = serde_json::from_str(source)?;
    if !(wire.scale_factor.is_finite() && wire.scale_factor > 0.0) {
        return Err(IoError::InvalidSnapshot(format!(
            "缩放系数 {} 无效",
            wire.scale_factor
        )));
    }
    let tires = wire
        .tires
        .into_iter()
        .map(TireRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Snapshot::new(
        tires,
        wire.bay_length_mm,
        wire.id_counter,
        wire.scale_factor,
    ))
}
