//! Per-floe interaction bookkeeping filled by the collision engine.

use serde::{Deserialize, Serialize};

use crate::utils::math::FloeFloat;

/// Partner index of an interaction with a domain wall.
pub const DOMAIN_PARTNER: i64 = -1;

/// Partner index of an interaction with a topography element.
pub const TOPOGRAPHY_PARTNER: i64 = -2;

/// One collision interaction acting on a floe.
///
/// `other_idx` is the partner's index in the floe list, or one of the
/// negative sentinels above. Forces are the force ON the owning floe;
/// `(px, py)` is the application point; `torque` is filled by the third
/// collision pass; `overlap` is the overlap region area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction<F> {
    pub other_idx: i64,
    pub fx: F,
    pub fy: F,
    pub px: F,
    pub py: F,
    pub torque: F,
    pub overlap: F,
}

/// Dynamic interaction table owned by a single floe.
///
/// Rows are stored contiguously and the backing buffer grows by doubling;
/// rows are never shared between floes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionTable<F> {
    rows: Vec<Interaction<F>>,
}

impl<F: FloeFloat> InteractionTable<F> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn push(&mut self, row: Interaction<F>) {
        if self.rows.len() == self.rows.capacity() {
            let grown = (self.rows.capacity() * 2).max(4);
            self.rows.reserve_exact(grown - self.rows.len());
        }
        self.rows.push(row);
    }

    pub fn extend_from(&mut self, other: impl IntoIterator<Item = Interaction<F>>) {
        for row in other {
            self.push(row);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Number of interactions recorded this step.
    pub fn num_inters(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Interaction<F>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Interaction<F>] {
        &mut self.rows
    }

    /// Drops rows whose partner fails `keep`, remapping surviving partner
    /// indices with `remap`.
    pub fn retain_partners(
        &mut self,
        mut keep: impl FnMut(i64) -> bool,
        mut remap: impl FnMut(i64) -> i64,
    ) {
        self.rows.retain(|row| keep(row.other_idx));
        for row in &mut self.rows {
            row.other_idx = remap(row.other_idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(other: i64, fx: f64) -> Interaction<f64> {
        Interaction {
            other_idx: other,
            fx,
            fy: 0.0,
            px: 0.0,
            py: 0.0,
            torque: 0.0,
            overlap: 1.0,
        }
    }

    #[test]
    fn push_and_count() {
        let mut table = InteractionTable::new();
        for i in 0..10 {
            table.push(row(i, i as f64));
        }
        assert_eq!(table.num_inters(), 10);
        assert_eq!(table.rows()[3].other_idx, 3);
    }

    #[test]
    fn retain_drops_and_remaps() {
        let mut table = InteractionTable::new();
        table.push(row(0, 1.0));
        table.push(row(2, 2.0));
        table.push(row(DOMAIN_PARTNER, 3.0));
        table.retain_partners(
            |idx| idx != 0,
            |idx| if idx > 0 { idx - 1 } else { idx },
        );
        assert_eq!(table.num_inters(), 2);
        assert_eq!(table.rows()[0].other_idx, 1);
        assert_eq!(table.rows()[1].other_idx, DOMAIN_PARTNER);
    }
}
