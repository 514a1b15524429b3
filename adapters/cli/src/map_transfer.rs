use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warpflow_core::{GridDimensions, MapLayout};
use warpflow_world::map::{clip_layout, dense_from_layout, layout_from_dense, DenseLayout};

const TRANSFER_DOMAIN: &str = "warp";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded map payload.
pub(crate) const TRANSFER_HEADER: &str = "warp:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Map layout together with the grid it was drawn for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MapTransfer {
    /// Grid the layout belongs to.
    pub(crate) dimensions: GridDimensions,
    /// Obstacles and scoring tiles.
    pub(crate) layout: MapLayout,
}

impl MapTransfer {
    /// Creates a transfer value, dropping layout entries outside the grid.
    #[must_use]
    pub(crate) fn new(dimensions: GridDimensions, layout: &MapLayout) -> Self {
        Self {
            dimensions,
            layout: clip_layout(layout, dimensions),
        }
    }

    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, MapTransferError> {
        let payload = TransferPayload {
            map: dense_from_layout(&self.layout, self.dimensions),
        };
        let json = serde_json::to_vec(&payload).map_err(MapTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{TRANSFER_HEADER}:{}x{}:{encoded}",
            self.dimensions.width(),
            self.dimensions.height()
        ))
    }

    /// Decodes a layout from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, MapTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MapTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(MapTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(MapTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(MapTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(MapTransferError::MissingPayload)?;

        if domain != TRANSFER_DOMAIN {
            return Err(MapTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSFER_VERSION {
            return Err(MapTransferError::UnsupportedVersion(version.to_owned()));
        }

        let dimensions = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(MapTransferError::InvalidEncoding)?;
        let decoded: TransferPayload =
            serde_json::from_slice(&bytes).map_err(MapTransferError::InvalidPayload)?;

        Ok(Self {
            dimensions,
            layout: layout_from_dense(&decoded.map, dimensions),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TransferPayload {
    map: DenseLayout,
}

/// Errors that can occur while converting map transfer strings.
#[derive(Debug, Error)]
pub(crate) enum MapTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("map string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("map string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("map string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("map string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("map string is missing the payload")]
    MissingPayload,
    /// The prefix segment named another format.
    #[error("map prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version is not understood.
    #[error("map version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode map payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be (de)serialised.
    #[error("could not parse map payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<GridDimensions, MapTransferError> {
    let invalid = || MapTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok(GridDimensions::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpflow_core::{Position, ScoringTile, TUTORIAL_GRID};

    #[test]
    fn tutorial_map_survives_transfer() {
        let layout = MapLayout {
            blocked: vec![Position::new(3, 8), Position::new(7, 3)],
            scoring: vec![
                ScoringTile {
                    position: Position::new(5, 8),
                    points: 1,
                    one_time: false,
                },
                ScoringTile {
                    position: Position::new(8, 9),
                    points: 2,
                    one_time: true,
                },
            ],
        };
        let transfer = MapTransfer::new(TUTORIAL_GRID, &layout);

        let encoded = transfer.encode().expect("layout encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:17x11:")));

        let decoded = MapTransfer::decode(&encoded).expect("layout decodes");
        assert_eq!(decoded, transfer);
    }

    #[test]
    fn entries_outside_the_grid_are_dropped() {
        let layout = MapLayout {
            blocked: vec![Position::new(40, 2)],
            scoring: Vec::new(),
        };
        let transfer = MapTransfer::new(GridDimensions::new(4, 4), &layout);
        assert!(transfer.layout.blocked.is_empty());
    }

    #[test]
    fn malformed_strings_are_rejected_without_panicking() {
        assert!(matches!(
            MapTransfer::decode("   "),
            Err(MapTransferError::EmptyPayload)
        ));
        assert!(matches!(
            MapTransfer::decode("grid:v1:4x4:e30"),
            Err(MapTransferError::InvalidPrefix(prefix)) if prefix == "grid"
        ));
        assert!(matches!(
            MapTransfer::decode("warp:v2:4x4:e30"),
            Err(MapTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            MapTransfer::decode("warp:v1:0x4:e30"),
            Err(MapTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            MapTransfer::decode("warp:v1:4x4"),
            Err(MapTransferError::MissingPayload)
        ));
        assert!(matches!(
            MapTransfer::decode("warp:v1:4x4:%%%"),
            Err(MapTransferError::InvalidEncoding(_))
        ));
        assert!(matches!(
            MapTransfer::decode("warp:v1:4x4:e30"),
            Err(MapTransferError::InvalidPayload(_))
        ));
    }
}
