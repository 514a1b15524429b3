use std::io::Write;

use anyhow::{Context, Result};
use warpflow_core::Side;
use warpflow_rendering::{CellVisual, RenderingBackend, Scene, SceneCell};

/// Text backend that prints scenes as a character grid.
///
/// Every cell takes two characters: an overlay glyph for its visual state
/// followed by the cell content.
#[derive(Debug)]
pub(crate) struct AsciiBackend<W> {
    out: W,
}

impl<W: Write> AsciiBackend<W> {
    /// Creates a backend writing into `out`.
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderingBackend for AsciiBackend<W> {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        writeln!(
            self.out,
            "turn {} | round {} | creator {} joiner {}",
            side_name(scene.current_turn),
            scene.round,
            scene.scores.creator,
            scene.scores.joiner
        )
        .context("failed to write scene header")?;

        let mut header = String::from("   ");
        for col in 0..scene.dimensions.width() {
            header.push_str(&format!("{:<2}", col % 100));
        }
        writeln!(self.out, "{}", header.trim_end()).context("failed to write column header")?;

        for row in scene.cells.chunks(scene.dimensions.width() as usize) {
            let Some(first) = row.first() else {
                continue;
            };
            let mut line = format!("{:>2} ", first.position.row());
            for cell in row {
                line.push(overlay_glyph(cell.visual));
                line.push(content_glyph(cell));
            }
            writeln!(self.out, "{}", line.trim_end()).context("failed to write grid row")?;
        }

        if let Some(label) = &scene.damage_label {
            writeln!(self.out, "target at {}: {}", label.position, label.text)
                .context("failed to write damage label")?;
        }
        self.out.flush().context("failed to flush scene")
    }
}

pub(crate) const fn side_name(side: Side) -> &'static str {
    match side {
        Side::Creator => "creator",
        Side::Joiner => "joiner",
    }
}

const fn overlay_glyph(visual: CellVisual) -> char {
    match visual {
        CellVisual::Selected { .. } => '@',
        CellVisual::Moved => '~',
        CellVisual::SelectedTarget(_) => '!',
        CellVisual::ValidTarget(_) => '?',
        CellVisual::AssistCandidate => '+',
        CellVisual::MovementTile => 'o',
        CellVisual::ThreatTile => 'x',
        CellVisual::Idle => ' ',
    }
}

fn content_glyph(cell: &SceneCell) -> char {
    let context = &cell.context;
    match context.occupant {
        Some(occupant) if occupant.owner == Side::Creator => 'C',
        Some(_) => 'J',
        None if context.blocked => '#',
        None if context.staged => '*',
        None if context.scoring.yields_points() => '$',
        None => '.',
    }
}
