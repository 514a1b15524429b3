//! Selection bookkeeping owned by the action state machine.

use warpflow_core::{Position, ShipId, TargetChoice, WeaponMode};

/// Coarse state of the action state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing is selected.
    Idle,
    /// A ship is selected without a staged move or target.
    ShipSelected,
    /// A destination is staged for the selected ship.
    PreviewingMove,
    /// A target is picked for the selected ship.
    Targeting,
}

/// Transient selection of the acting player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    /// Selected ship.
    pub ship: ShipId,
    /// Staged destination. Does not occupy the cell.
    pub preview: Option<Position>,
    /// Picked target.
    pub target: Option<TargetChoice>,
    /// Active weapon mode.
    pub mode: WeaponMode,
    /// Whether the ship may act. Ships of the other side, or ships that
    /// already acted, can be inspected but not ordered.
    pub actionable: bool,
}

impl Selection {
    pub(crate) const fn new(ship: ShipId, actionable: bool) -> Self {
        Self {
            ship,
            preview: None,
            target: None,
            mode: WeaponMode::Primary,
            actionable,
        }
    }

    /// Phase implied by the selection.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.target.is_some() {
            Phase::Targeting
        } else if self.preview.is_some() {
            Phase::PreviewingMove
        } else {
            Phase::ShipSelected
        }
    }
}

/// In-flight drag of the selected ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Drag {
    /// Selection as it was before the drag started.
    pub(crate) stash: Selection,
    /// Cell currently under the pointer.
    pub(crate) hover: Option<Position>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_prefers_target_over_preview() {
        let mut selection = Selection::new(ShipId::new(1), true);
        assert_eq!(selection.phase(), Phase::ShipSelected);
        selection.preview = Some(Position::new(1, 1));
        assert_eq!(selection.phase(), Phase::PreviewingMove);
        selection.target = Some(TargetChoice::AreaEffect);
        assert_eq!(selection.phase(), Phase::Targeting);
    }
}
