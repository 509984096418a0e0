//! The monitor set: rectangular outputs with names, struts and root
//! frames (spec.md §3 "Monitor", §4.B).
//!
//! Grounded in `original_source/src/monitor.c` for merge/adjacency
//! semantics and in DESIGN NOTES (spec.md §9) for the representation:
//! monitors live in a `Vec<Monitor>` arena indexed by `MonitorId`, mirroring
//! the teacher's habit of indexing `heapless::Vec<Monitor, _>` by position
//! (`pgwm-core/src/state/mod.rs`) but generalized to a growable arena since
//! fensterchef has no fixed `WORKSPACE_CAP`-style ceiling on monitor count.

use crate::error::{Error, Result};
use crate::frame::{Direction, FrameArena};
use crate::geometry::{BitGravity, Extents, Rectangle, Size};
use crate::glob;
use crate::ids::{FrameId, MonitorId};

#[derive(Debug, Clone)]
pub struct Monitor {
    pub name: String,
    pub rect: Rectangle,
    pub strut: Extents,
    pub root: FrameId,
}

/// The ordered list of outputs, head-first; the first entry is primary
/// (spec.md §3 "Monitor").
#[derive(Debug, Default)]
pub struct MonitorSet {
    monitors: Vec<Monitor>,
}

/// One freshly queried output, prior to merging against the existing set.
#[derive(Debug, Clone)]
pub struct QueriedOutput {
    pub name: String,
    pub rect: Rectangle,
    pub primary: bool,
}

impl MonitorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn get(&self, id: MonitorId) -> &Monitor {
        &self.monitors[id.index()]
    }

    pub fn get_mut(&mut self, id: MonitorId) -> &mut Monitor {
        &mut self.monitors[id.index()]
    }

    pub fn try_get(&self, id: MonitorId) -> Result<&Monitor> {
        self.monitors.get(id.index()).ok_or(Error::UnknownMonitor(id))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<MonitorId> {
        (0..self.monitors.len()).map(MonitorId).collect()
    }

    #[must_use]
    pub fn roots(&self) -> Vec<FrameId> {
        self.monitors.iter().map(|m| m.root).collect()
    }

    #[must_use]
    pub fn first(&self) -> Option<MonitorId> {
        if self.monitors.is_empty() {
            None
        } else {
            Some(MonitorId(0))
        }
    }

    /// Deterministically merges a freshly queried `RandR` output list
    /// (or a single synthesized fallback monitor) into a flat, primary
    /// ordered vector: duplicates contained entirely within another
    /// rectangle are merged into the larger one, and the reported
    /// primary output (if any) is spliced to the front.
    #[must_use]
    pub fn normalize_query(mut outputs: Vec<QueriedOutput>) -> Vec<QueriedOutput> {
        let mut i = 0;
        while i < outputs.len() {
            let mut j = i + 1;
            let mut merged_any = false;
            while j < outputs.len() {
                if outputs[i].rect.contains_rect(&outputs[j].rect) {
                    outputs.remove(j);
                    merged_any = true;
                } else if outputs[j].rect.contains_rect(&outputs[i].rect) {
                    outputs[i].rect = outputs[j].rect;
                    outputs[i].primary = outputs[i].primary || outputs[j].primary;
                    outputs.remove(j);
                    merged_any = true;
                } else {
                    j += 1;
                }
            }
            if !merged_any {
                i += 1;
            }
        }
        if let Some(primary_idx) = outputs.iter().position(|o| o.primary) {
            let primary = outputs.remove(primary_idx);
            outputs.insert(0, primary);
        }
        outputs
    }

    /// Name-based merge: copies each prior monitor's root frame onto the
    /// new monitor sharing its name, stashes roots whose monitor vanished
    /// (preserving inner windows; returns their frame ids so the caller
    /// can hide their windows abruptly and incref them), destroys nothing
    /// by itself (caller owns window teardown), and allocates fresh or
    /// stash-recycled roots for any new monitor that had no predecessor.
    /// Finally reconfigures struts. Returns the frames that need to be
    /// stashed by the caller (they are *not* stashed here, since stashing
    /// requires window visibility side effects that belong to the window
    /// model) plus the new `MonitorSet`.
    pub fn merge(
        &self,
        queried: Vec<QueriedOutput>,
        frames: &mut FrameArena,
        auto_fill_void: bool,
    ) -> MergeResult {
        let mut vanished_roots = Vec::new();
        let mut new_monitors = Vec::with_capacity(queried.len());
        let mut used_prior = vec![false; self.monitors.len()];

        for q in &queried {
            if let Some((idx, prior)) = self
                .monitors
                .iter()
                .enumerate()
                .find(|(_, m)| m.name == q.name)
            {
                used_prior[idx] = true;
                new_monitors.push(Monitor {
                    name: q.name.clone(),
                    rect: q.rect,
                    strut: Extents::default(),
                    root: prior.root,
                });
            } else {
                let root = if auto_fill_void {
                    frames.pop(|_| true).map(|(id, _)| id)
                } else {
                    None
                }
                .unwrap_or_else(|| frames.new_leaf(q.rect));
                new_monitors.push(Monitor {
                    name: q.name.clone(),
                    rect: q.rect,
                    strut: Extents::default(),
                    root,
                });
            }
        }

        for (idx, prior) in self.monitors.iter().enumerate() {
            if !used_prior[idx] {
                vanished_roots.push(prior.root);
            }
        }

        // `monitor_root` must mirror each root's *final* index in
        // `new_monitors`, not whatever index it carried from a previous
        // merge (a reused or stash-recycled root) or none at all (a
        // brand-new `new_leaf` root) -- `monitor_of_frame` walks up to
        // this field, so a stale or missing value would strand it.
        for (idx, m) in new_monitors.iter().enumerate() {
            frames.get_mut(m.root).monitor_root = Some(MonitorId(idx));
        }

        MergeResult {
            monitors: MonitorSet { monitors: new_monitors },
            vanished_roots,
        }
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<MonitorId> {
        self.monitors
            .iter()
            .position(|m| m.name == name)
            .map(MonitorId)
    }

    #[must_use]
    pub fn by_pattern(&self, pattern: &str) -> Option<MonitorId> {
        self.monitors
            .iter()
            .position(|m| glob::matches(pattern, &m.name))
            .map(MonitorId)
    }

    /// Glob lookup with a fallback to the primary monitor when nothing
    /// matches (spec.md §4.B `get_monitor_from_rectangle_or_primary`'s
    /// pattern counterpart).
    #[must_use]
    pub fn by_pattern_or_primary(&self, pattern: &str) -> Option<MonitorId> {
        self.by_pattern(pattern).or_else(|| self.first())
    }

    /// Prefers the monitor whose rectangle contains `rect`'s center;
    /// otherwise maximizes intersection area.
    #[must_use]
    pub fn from_rectangle(&self, rect: &Rectangle) -> Option<MonitorId> {
        let center = rect.center();
        if let Some(idx) = self
            .monitors
            .iter()
            .position(|m| m.rect.contains_point(center))
        {
            return Some(MonitorId(idx));
        }
        self.monitors
            .iter()
            .enumerate()
            .max_by_key(|(_, m)| m.rect.overlap_area(rect))
            .filter(|(_, m)| m.rect.overlap_area(rect) > 0)
            .map(|(idx, _)| MonitorId(idx))
    }

    #[must_use]
    pub fn from_rectangle_or_primary(&self, rect: &Rectangle) -> Option<MonitorId> {
        self.from_rectangle(rect).or_else(|| self.first())
    }

    /// Two-pass directional preference: a candidate *strongly* matches
    /// if it overlaps the source on the perpendicular axis, *weakly*
    /// otherwise. Strong dominates weak; ties broken by nearest edge,
    /// then smallest perpendicular offset to the source's centerline
    /// (spec.md §4.B "Directional monitor").
    #[must_use]
    pub fn directional(&self, from: MonitorId, dir: Direction) -> Option<MonitorId> {
        let src = self.get(from).rect;
        let axis_perp_is_vertical = matches!(dir, Direction::Left | Direction::Right);
        let src_center = src.center();

        let mut best: Option<(MonitorId, bool, i64, i64)> = None; // (id, strong, edge_dist, perp_offset)
        for (idx, m) in self.monitors.iter().enumerate() {
            if idx == from.index() {
                continue;
            }
            let cand = m.rect;
            let in_direction = match dir {
                Direction::Left => cand.right() <= src.x,
                Direction::Right => cand.x >= src.right(),
                Direction::Up => cand.bottom() <= src.y,
                Direction::Down => cand.y >= src.bottom(),
            };
            if !in_direction {
                continue;
            }
            let strong = if axis_perp_is_vertical {
                cand.y < src.bottom() && cand.bottom() > src.y
            } else {
                cand.x < src.right() && cand.right() > src.x
            };
            let edge_dist = match dir {
                Direction::Left => i64::from(src.x) - i64::from(cand.right()),
                Direction::Right => i64::from(cand.x) - i64::from(src.right()),
                Direction::Up => i64::from(src.y) - i64::from(cand.bottom()),
                Direction::Down => i64::from(cand.y) - i64::from(src.bottom()),
            };
            let cand_center = cand.center();
            let perp_offset = if axis_perp_is_vertical {
                (i64::from(cand_center.y) - i64::from(src_center.y)).abs()
            } else {
                (i64::from(cand_center.x) - i64::from(src_center.x)).abs()
            };

            let better = match &best {
                None => true,
                Some((_, b_strong, b_edge, b_perp)) => {
                    if strong != *b_strong {
                        strong
                    } else if strong {
                        edge_dist < *b_edge || (edge_dist == *b_edge && perp_offset < *b_perp)
                    } else {
                        perp_offset < *b_perp || (perp_offset == *b_perp && edge_dist < *b_edge)
                    }
                }
            };
            if better {
                best = Some((MonitorId(idx), strong, edge_dist, perp_offset));
            }
        }
        best.map(|(id, ..)| id)
    }

    /// Recomputes every monitor's accumulated strut from its visible dock
    /// windows and resizes each root frame to its rectangle minus strut,
    /// clamped to at least 1x1. `docks` is `(monitor, partial_strut,
    /// gravity)` for every currently visible dock window, already
    /// assigned to the monitor it anchors to by the caller (rectangle
    /// overlap -- window-model concern, so it lives outside this
    /// function per spec.md's component split).
    pub fn reconfigure(&mut self, frames: &mut FrameArena, docks: &[(MonitorId, Extents)]) {
        for m in &mut self.monitors {
            m.strut = Extents::default();
        }
        for (mon, strut) in docks {
            let m = &mut self.monitors[mon.index()];
            m.strut.left = m.strut.left.max(strut.left);
            m.strut.right = m.strut.right.max(strut.right);
            m.strut.top = m.strut.top.max(strut.top);
            m.strut.bottom = m.strut.bottom.max(strut.bottom);
        }
        for m in &self.monitors {
            let inner = m.rect.shrink(&m.strut);
            let clamped = Rectangle::new(inner.x, inner.y, inner.w.max(1), inner.h.max(1));
            resize_root(frames, m.root, clamped);
        }
    }

    /// Given a monitor and a window size, computes the top-left corner
    /// such that `gravity` holds relative to the monitor (spec.md §4.B
    /// "Gravity adjustment").
    #[must_use]
    pub fn gravity_point(&self, id: MonitorId, gravity: BitGravity, size: Size) -> crate::geometry::Point {
        self.get(id).rect.at_gravity(gravity, size)
    }
}

fn resize_root(frames: &mut FrameArena, root: FrameId, rect: Rectangle) {
    let mut scratch = Vec::new();
    frames.resize(root, rect, rect, &crate::frame::Gaps::default(), 0, &mut scratch);
}

pub struct MergeResult {
    pub monitors: MonitorSet,
    /// Roots belonging to monitors that vanished in this merge; the
    /// caller must stash these (the window model decides how to hide
    /// their windows first).
    pub vanished_roots: Vec<FrameId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MonitorId;

    fn set_with(rects: &[(&str, i32, i32, u32, u32)]) -> (MonitorSet, FrameArena) {
        let mut frames = FrameArena::new();
        let monitors = rects
            .iter()
            .map(|(name, x, y, w, h)| {
                let rect = Rectangle::new(*x, *y, *w, *h);
                Monitor {
                    name: (*name).to_string(),
                    rect,
                    strut: Extents::default(),
                    root: frames.new_leaf(rect),
                }
            })
            .collect();
        (MonitorSet { monitors }, frames)
    }

    #[test]
    fn directional_right_reaches_adjacent() {
        let (set, _frames) = set_with(&[("Main", 0, 0, 800, 600), ("Right", 810, 0, 800, 600)]);
        let right = set.directional(MonitorId(0), Direction::Right);
        assert_eq!(right, Some(MonitorId(1)));
    }

    #[test]
    fn directional_left_from_leftmost_is_none() {
        let (set, _frames) = set_with(&[("FarLeft", 0, 0, 800, 600), ("Right", 810, 0, 800, 600)]);
        assert_eq!(set.directional(MonitorId(0), Direction::Left), None);
    }

    /// spec.md §8 scenario 3: an arrangement with a disconnected pair of
    /// monitors above a main row must still resolve directional queries
    /// deterministically, including a "no match" case at the left edge.
    #[test]
    fn scenario_3_directional_fixture() {
        let (set, _frames) = set_with(&[
            ("FarLeft", 0, 600, 800, 600),
            ("Main", 810, 600, 800, 600),
            ("Right", 1620, 600, 800, 600),
            ("FarRight", 2430, 600, 800, 600),
            ("FarTop", 4000, 0, 800, 600),
            ("Disconnected2", 4000, 4000, 800, 600),
        ]);
        let far_right = MonitorId(3);
        let right = MonitorId(2);
        let disconnected2 = MonitorId(5);
        let far_top = MonitorId(4);
        let far_left = MonitorId(0);

        assert_eq!(set.directional(far_right, Direction::Left), Some(right));
        assert_eq!(set.directional(disconnected2, Direction::Up), Some(far_top));
        assert_eq!(set.directional(far_left, Direction::Left), None);
    }

    #[test]
    fn normalize_query_merges_contained_rect() {
        let outputs = vec![
            QueriedOutput { name: "A".into(), rect: Rectangle::new(0, 0, 1000, 1000), primary: false },
            QueriedOutput { name: "B".into(), rect: Rectangle::new(10, 10, 100, 100), primary: true },
        ];
        let merged = MonitorSet::normalize_query(outputs);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rect, Rectangle::new(0, 0, 1000, 1000));
    }
}
