//! The frame tree: a binary partition tree rooted at each monitor.
//!
//! Grounded in `original_source/include/core/frame.h` and
//! `src/frame.c` for the operation semantics, and in DESIGN NOTES
//! (spec.md §9) for the arena-of-IDs representation: frames live in a
//! `Vec<Option<Frame>>` slab indexed by `FrameId`, a free list recycles
//! slots once their refcount drops to zero, and cyclic parent/child/stash
//! links are plain indices rather than `Rc`/`RefCell`.
//!
//! Structural operations (`split`, `remove`, `exchange`, `equalize`, the
//! stash) only update topology, numbers and ratios; they never compute
//! pixel rectangles themselves. `resize` is the single place that turns
//! topology + ratio into rectangles, called once per monitor after any
//! mutation -- matching spec.md §4.F's "one synchronization pass per
//! event cycle" rather than threading incremental geometry updates
//! through every tree edit.

use crate::error::{Error, Result};
use crate::geometry::{Extents, Ratio, Rectangle};
use crate::ids::{FrameId, MonitorId, WindowId};

pub const FRAME_RESIZE_MINIMUM_SIZE: u32 = 12;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SplitDirection {
    /// children are left | right
    Horizontal,
    /// children are top | bottom
    Vertical,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    #[must_use]
    pub fn axis(self) -> SplitDirection {
        match self {
            Direction::Left | Direction::Right => SplitDirection::Horizontal,
            Direction::Up | Direction::Down => SplitDirection::Vertical,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    #[must_use]
    pub fn axis(self) -> SplitDirection {
        match self {
            Edge::Left | Edge::Right => SplitDirection::Horizontal,
            Edge::Top | Edge::Bottom => SplitDirection::Vertical,
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Gaps {
    pub inner: Extents,
    pub outer: Extents,
}

#[derive(Debug, Clone)]
pub struct Frame {
    refcount: u32,
    pub window: Option<WindowId>,
    pub rect: Rectangle,
    pub ratio: Ratio,
    pub split: SplitDirection,
    pub moved_from_left: bool,
    pub parent: Option<FrameId>,
    pub children: Option<(FrameId, FrameId)>,
    pub number: u32,
    stash_next: Option<FrameId>,
    pub monitor_root: Option<MonitorId>,
}

impl Frame {
    fn void(parent: Option<FrameId>) -> Self {
        Frame {
            refcount: 1,
            window: None,
            rect: Rectangle::default(),
            ratio: Ratio::HALF,
            split: SplitDirection::Horizontal,
            moved_from_left: false,
            parent,
            children: None,
            number: 0,
            stash_next: None,
            monitor_root: None,
        }
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.window.is_none() && self.children.is_none()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

struct TakenContent {
    window: Option<WindowId>,
    children: Option<(FrameId, FrameId)>,
    number: u32,
    ratio: Ratio,
    split: SplitDirection,
}

/// The arena owning every frame, visible or stashed.
#[derive(Debug, Default)]
pub struct FrameArena {
    slots: Vec<Option<Frame>>,
    free: Vec<usize>,
    stash_head: Option<FrameId>,
}

impl FrameArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: FrameId) -> &Frame {
        self.slots[id.index()]
            .as_ref()
            .expect("frame slot accessed after free")
    }

    pub fn get_mut(&mut self, id: FrameId) -> &mut Frame {
        self.slots[id.index()]
            .as_mut()
            .expect("frame slot accessed after free")
    }

    pub fn try_get(&self, id: FrameId) -> Result<&Frame> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownFrame(id))
    }

    fn alloc(&mut self, frame: Frame) -> FrameId {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(frame);
            FrameId(idx)
        } else {
            self.slots.push(Some(frame));
            FrameId(self.slots.len() - 1)
        }
    }

    #[must_use]
    pub fn new_leaf(&mut self, rect: Rectangle) -> FrameId {
        let mut f = Frame::void(None);
        f.rect = rect;
        self.alloc(f)
    }

    #[must_use]
    pub fn new_root(&mut self, monitor: MonitorId, rect: Rectangle) -> FrameId {
        let mut f = Frame::void(None);
        f.rect = rect;
        f.monitor_root = Some(monitor);
        self.alloc(f)
    }

    pub fn incref(&mut self, id: FrameId) {
        self.get_mut(id).refcount += 1;
    }

    /// Drops a reference; frees the slot once the count reaches zero.
    /// Reachable roots and stash heads always hold at least one
    /// reference (spec.md §3 "Frame" lifecycle).
    pub fn decref(&mut self, id: FrameId) {
        let refcount = {
            let f = self.get_mut(id);
            f.refcount -= 1;
            f.refcount
        };
        if refcount == 0 {
            self.slots[id.index()] = None;
            self.free.push(id.index());
        }
    }

    fn set_parent(&mut self, id: FrameId, parent: Option<FrameId>) {
        self.get_mut(id).parent = parent;
    }

    fn take_content(&mut self, id: FrameId) -> TakenContent {
        let f = self.get_mut(id);
        let taken = TakenContent {
            window: f.window.take(),
            children: f.children.take(),
            number: std::mem::take(&mut f.number),
            ratio: f.ratio,
            split: f.split,
        };
        f.ratio = Ratio::HALF;
        f.split = SplitDirection::Horizontal;
        taken
    }

    fn place_content(&mut self, id: FrameId, content: TakenContent) {
        if let Some((a, b)) = content.children {
            self.set_parent(a, Some(id));
            self.set_parent(b, Some(id));
        }
        let f = self.get_mut(id);
        f.window = content.window;
        f.children = content.children;
        f.number = content.number;
        f.ratio = content.ratio;
        f.split = content.split;
    }

    // ---- tree shape -----------------------------------------------

    /// Splits `from` in two: a fresh frame inherits `from`'s former
    /// content, a second fresh frame becomes an empty void. Returns
    /// `(new_content_holder, new_void)` in left-to-right /
    /// top-to-bottom order regardless of `is_left_split`.
    pub fn split(
        &mut self,
        from: FrameId,
        direction: SplitDirection,
        is_left_split: bool,
    ) -> (FrameId, FrameId) {
        let content = self.take_content(from);
        let new_id = self.alloc(Frame::void(Some(from)));
        self.place_content(new_id, content);
        let other_id = self.alloc(Frame::void(Some(from)));

        let f = self.get_mut(from);
        f.split = direction;
        f.ratio = Ratio::HALF;
        f.moved_from_left = is_left_split;
        f.children = Some(if is_left_split {
            (new_id, other_id)
        } else {
            (other_id, new_id)
        });
        (new_id, other_id)
    }

    /// Replaces `frame`'s parent with `frame`'s sibling, destroying the
    /// sibling slot. Returns the frame id that now carries the sibling's
    /// content (this is `frame`'s former parent, reused in place) plus
    /// the removed frame's window, if it had one tiling.
    pub fn remove(&mut self, frame: FrameId) -> Result<(FrameId, Option<WindowId>)> {
        let parent = self
            .get(frame)
            .parent
            .ok_or(Error::Invariant("remove() called on a root or stash frame"))?;
        let (a, b) = self.get(parent).children.expect("parent of a frame always has two children");
        let sibling = if a == frame { b } else { a };
        let removed_window = self.get(frame).window;

        let sib_content = self.take_content(sibling);
        self.place_content(parent, sib_content);
        self.decref(sibling);
        self.decref(frame);
        Ok((parent, removed_window))
    }

    /// Swaps the content (window, children, number, ratio, split) of two
    /// disjoint subtrees.
    pub fn exchange(&mut self, a: FrameId, b: FrameId) -> Result<()> {
        if a == b {
            return Ok(());
        }
        if self.is_ancestor(a, b) || self.is_ancestor(b, a) {
            return Err(Error::Invariant("exchange() requires disjoint subtrees"));
        }
        let ca = self.take_content(a);
        let cb = self.take_content(b);
        self.place_content(a, cb);
        self.place_content(b, ca);
        Ok(())
    }

    fn is_ancestor(&self, maybe_ancestor: FrameId, id: FrameId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == maybe_ancestor {
                return true;
            }
            cur = self.get(c).parent;
        }
        false
    }

    /// Leaf count "in direction `dir`": 1 at a leaf, the sum of the two
    /// children if the node splits along `dir`, the max otherwise.
    fn leaf_count(&self, id: FrameId, dir: SplitDirection) -> u32 {
        match self.get(id).children {
            None => 1,
            Some((a, b)) => {
                let (ca, cb) = (self.leaf_count(a, dir), self.leaf_count(b, dir));
                if self.get(id).split == dir {
                    ca + cb
                } else {
                    ca.max(cb)
                }
            }
        }
    }

    /// Divides span proportionally by leaf count along `dir`, recursing
    /// into children (spec.md §4.C "Equalize").
    pub fn equalize(&mut self, id: FrameId, dir: SplitDirection) {
        let children = self.get(id).children;
        if let Some((a, b)) = children {
            if self.get(id).split == dir {
                let ca = self.leaf_count(a, dir);
                let cb = self.leaf_count(b, dir);
                self.get_mut(id).ratio = Ratio::new(ca, (ca + cb).max(1));
            }
            self.equalize(a, dir);
            self.equalize(b, dir);
        }
    }

    /// Walks up from `id` while the parent's split matches `dir`,
    /// returning the topmost such ancestor (or `id` itself if its
    /// parent doesn't match).
    #[must_use]
    pub fn topmost_matching(&self, id: FrameId, dir: SplitDirection) -> FrameId {
        let mut cur = id;
        while let Some(parent) = self.get(cur).parent {
            if self.get(parent).split == dir {
                cur = parent;
            } else {
                break;
            }
        }
        cur
    }

    // ---- navigation -------------------------------------------------

    /// `best_leaf`: descend choosing, at each split, the child whose
    /// rectangle contains `(x, y)` on the split axis;
    /// `i32::MIN`/`i32::MAX` yield the most-left/right/top/bottom leaf.
    #[must_use]
    pub fn best_leaf(&self, mut id: FrameId, x: i32, y: i32) -> FrameId {
        loop {
            let f = self.get(id);
            let Some((a, b)) = f.children else {
                return id;
            };
            id = match f.split {
                SplitDirection::Horizontal => {
                    let split_x = self.get(a).rect.right();
                    if x < split_x {
                        a
                    } else {
                        b
                    }
                }
                SplitDirection::Vertical => {
                    let split_y = self.get(a).rect.bottom();
                    if y < split_y {
                        a
                    } else {
                        b
                    }
                }
            };
        }
    }

    /// Walks up until an ancestor splits along `dir.axis()` and we came
    /// from the far side, then descends into the sibling for as long as
    /// the same split direction continues on the near side. Returns
    /// `None` when no such ancestor exists.
    #[must_use]
    pub fn navigate(&self, from: FrameId, dir: Direction) -> Option<FrameId> {
        let axis = dir.axis();
        let mut node = from;
        let sibling = loop {
            let parent = self.get(node).parent?;
            let (left, right) = self.get(parent).children.expect("parent always has two children");
            let came_from_left = left == node;
            if self.get(parent).split == axis {
                let came_from_far = match dir {
                    Direction::Left | Direction::Up => !came_from_left,
                    Direction::Right | Direction::Down => came_from_left,
                };
                if came_from_far {
                    break if came_from_left { right } else { left };
                }
            }
            node = parent;
        };
        Some(self.descend_near_side(sibling, dir))
    }

    fn descend_near_side(&self, mut id: FrameId, dir: Direction) -> FrameId {
        let axis = dir.axis();
        loop {
            let f = self.get(id);
            let Some((a, b)) = f.children else {
                return id;
            };
            if f.split != axis {
                return id;
            }
            id = match dir {
                Direction::Left | Direction::Up => b,
                Direction::Right | Direction::Down => a,
            };
        }
    }

    // ---- move ---------------------------------------------------------

    /// Relocates `id`'s content to sit adjacent to the frame found by
    /// navigating `dir`, falling back to `cross_monitor_root` (the
    /// adjacent monitor's root frame) when there is no in-tree
    /// neighbor. Returns whether anything moved.
    ///
    /// The four tree shapes spec.md's case table distinguishes
    /// (void-replace, perpendicular-parent-split, no-suitable-sibling,
    /// composite-subtree) collapse here into two code paths: replace a
    /// void outright, or wrap everything else -- a void replace when
    /// possible, a wrap otherwise, whether or not the target already has
    /// children.
    pub fn move_towards(
        &mut self,
        id: FrameId,
        dir: Direction,
        cross_monitor_root: Option<FrameId>,
    ) -> bool {
        let Some(target) = self.navigate(id, dir).or(cross_monitor_root) else {
            return false;
        };
        if target == id {
            return false;
        }
        if self.get(target).is_void() {
            let _ = self.exchange(id, target);
        } else {
            self.wrap_with_content(target, id, dir);
        }
        true
    }

    /// Wraps `target` in a new parent, placing `mover`'s content on the
    /// side facing `dir` and `target`'s former content on the other
    /// side.
    fn wrap_with_content(&mut self, target: FrameId, mover: FrameId, dir: Direction) {
        let target_parent = self.get(target).parent;
        let target_content = self.take_content(target);
        let mover_content = self.take_content(mover);

        let new_target_home = self.alloc(Frame::void(Some(target)));
        self.place_content(new_target_home, target_content);
        let mover_home = self.alloc(Frame::void(Some(target)));
        self.place_content(mover_home, mover_content);

        let is_mover_left = matches!(dir, Direction::Left | Direction::Up);
        let f = self.get_mut(target);
        f.split = dir.axis();
        f.ratio = Ratio::HALF;
        f.children = Some(if is_mover_left {
            (mover_home, new_target_home)
        } else {
            (new_target_home, mover_home)
        });
        let _ = target_parent;
    }

    // ---- resize ---------------------------------------------------------

    fn effective_gaps(rect: &Rectangle, root_rect: &Rectangle, gaps: &Gaps) -> Extents {
        Extents {
            left: if rect.x == root_rect.x {
                gaps.outer.left
            } else {
                gaps.inner.left
            },
            right: if rect.right() == root_rect.right() {
                gaps.outer.right
            } else {
                gaps.inner.right
            },
            top: if rect.y == root_rect.y {
                gaps.outer.top
            } else {
                gaps.inner.top
            },
            bottom: if rect.bottom() == root_rect.bottom() {
                gaps.outer.bottom
            } else {
                gaps.inner.bottom
            },
        }
    }

    fn inner_window_rect(rect: &Rectangle, root_rect: &Rectangle, gaps: &Gaps, border: u32) -> Rectangle {
        let gapped = rect.shrink(&Self::effective_gaps(rect, root_rect, gaps));
        let w = gapped.w.saturating_sub(2 * border);
        let h = gapped.h.saturating_sub(2 * border);
        Rectangle {
            x: gapped.x + border as i32,
            y: gapped.y + border as i32,
            w,
            h,
        }
    }

    /// Assigns `rect` to `id`, then recursively sizes children using the
    /// stored split ratio. Pushes `(window, inner_rect)` for every leaf
    /// with a window into `out`.
    pub fn resize(
        &mut self,
        id: FrameId,
        rect: Rectangle,
        root_rect: Rectangle,
        gaps: &Gaps,
        border: u32,
        out: &mut Vec<(WindowId, Rectangle)>,
    ) {
        self.resize_impl(id, rect, root_rect, gaps, border, out, false);
    }

    /// As `resize`, but for every split along the way uses the *current*
    /// ratio of the two children's existing rectangles rather than the
    /// stored ratio, which may be stale after an ancestor resize.
    pub fn resize_ignoring_ratio(
        &mut self,
        id: FrameId,
        rect: Rectangle,
        root_rect: Rectangle,
        gaps: &Gaps,
        border: u32,
        out: &mut Vec<(WindowId, Rectangle)>,
    ) {
        self.resize_impl(id, rect, root_rect, gaps, border, out, true);
    }

    fn resize_impl(
        &mut self,
        id: FrameId,
        rect: Rectangle,
        root_rect: Rectangle,
        gaps: &Gaps,
        border: u32,
        out: &mut Vec<(WindowId, Rectangle)>,
        ignore_ratio: bool,
    ) {
        let (children, window, ratio, split) = {
            let f = self.get_mut(id);
            f.rect = rect;
            (f.children, f.window, f.ratio, f.split)
        };
        if let Some(w) = window {
            out.push((w, Self::inner_window_rect(&rect, &root_rect, gaps, border)));
        }
        if let Some((a, b)) = children {
            let effective_ratio = if ignore_ratio {
                let (ra, rb) = (self.get(a).rect, self.get(b).rect);
                match split {
                    SplitDirection::Horizontal => Ratio::from_lengths(ra.w, ra.w + rb.w),
                    SplitDirection::Vertical => Ratio::from_lengths(ra.h, ra.h + rb.h),
                }
            } else {
                ratio
            };
            match split {
                SplitDirection::Horizontal => {
                    let left_w = effective_ratio.apply(rect.w);
                    let ra = Rectangle::new(rect.x, rect.y, left_w, rect.h);
                    let rb = Rectangle::new(rect.x + left_w as i32, rect.y, rect.w - left_w, rect.h);
                    self.resize_impl(a, ra, root_rect, gaps, border, out, ignore_ratio);
                    self.resize_impl(b, rb, root_rect, gaps, border, out, ignore_ratio);
                }
                SplitDirection::Vertical => {
                    let top_h = effective_ratio.apply(rect.h);
                    let ra = Rectangle::new(rect.x, rect.y, rect.w, top_h);
                    let rb = Rectangle::new(rect.x, rect.y + top_h as i32, rect.w, rect.h - top_h);
                    self.resize_impl(a, ra, root_rect, gaps, border, out, ignore_ratio);
                    self.resize_impl(b, rb, root_rect, gaps, border, out, ignore_ratio);
                }
            }
        }
    }

    // ---- bump_edge --------------------------------------------------

    /// Grows (or shrinks, for negative `amount`) `edge` of `id` by
    /// cooperating with the adjacent sibling, which cedes space down to
    /// its own minimum. Returns the delta actually applied.
    pub fn bump_edge(&mut self, id: FrameId, edge: Edge, amount: i32) -> i32 {
        let axis = edge.axis();
        let Some(parent) = self.get(id).parent else {
            return 0;
        };
        if self.get(parent).split != axis {
            return self.bump_edge(parent, edge, amount);
        }
        let (a, b) = self.get(parent).children.unwrap();
        let id_is_a = a == id;
        // moving the edge that touches the sibling grows `id` by taking
        // from the sibling; the opposite edge would grow `id` by pushing
        // the parent's own bound, which we don't own here.
        let growing_towards_sibling = match edge {
            Edge::Right => id_is_a,
            Edge::Left => !id_is_a,
            Edge::Bottom => id_is_a,
            Edge::Top => !id_is_a,
        };
        if !growing_towards_sibling {
            return self.bump_edge(parent, edge, amount);
        }

        let total = match axis {
            SplitDirection::Horizontal => self.get(parent).rect.w,
            SplitDirection::Vertical => self.get(parent).rect.h,
        };
        let id_len = match axis {
            SplitDirection::Horizontal => self.get(id).rect.w,
            SplitDirection::Vertical => self.get(id).rect.h,
        };
        let sibling = if id_is_a { b } else { a };
        let sib_len = self.min_size(sibling, axis);
        let current_sib_len = total.saturating_sub(id_len);

        let applied = if amount >= 0 {
            amount.min((current_sib_len.saturating_sub(sib_len)) as i32)
        } else {
            let id_min = self.min_size(id, axis) as i32;
            amount.max(-(id_len as i32 - id_min))
        };
        let new_id_len = (id_len as i32 + applied).max(0) as u32;
        let ratio = Ratio::from_lengths(
            if id_is_a { new_id_len } else { total - new_id_len },
            total,
        );
        self.get_mut(parent).ratio = ratio;
        applied
    }

    fn min_size(&self, id: FrameId, axis: SplitDirection) -> u32 {
        let f = self.get(id);
        match f.children {
            None => FRAME_RESIZE_MINIMUM_SIZE,
            Some((a, b)) => {
                let (ma, mb) = (self.min_size(a, axis), self.min_size(b, axis));
                if f.split == axis {
                    ma + mb
                } else {
                    ma.max(mb)
                }
            }
        }
    }

    // ---- stash --------------------------------------------------------

    /// Detaches `id` from its parent tree position, turning `id`'s slot
    /// into the LIFO head. Returns the windows that were visible under
    /// `id` (caller hides them abruptly and ref-counts them up).
    pub fn stash_later(&mut self, id: FrameId) -> Vec<WindowId> {
        if let Some(parent) = self.get(id).parent {
            let _ = self.remove_detach_only(id, parent);
        }
        self.get_mut(id).parent = None;
        self.get_mut(id).stash_next = self.stash_head;
        self.stash_head = Some(id);
        self.incref(id);
        self.collect_windows(id)
    }

    /// Detaches `id` from `parent`'s slot without destroying anything,
    /// promoting the sibling into `parent` exactly like `remove`, but
    /// without decreffing `id` (the caller keeps it alive for the
    /// stash).
    fn remove_detach_only(&mut self, id: FrameId, parent: FrameId) {
        let (a, b) = self.get(parent).children.unwrap();
        let sibling = if a == id { b } else { a };
        let sib_content = self.take_content(sibling);
        self.place_content(parent, sib_content);
        self.decref(sibling);
    }

    fn collect_windows(&self, id: FrameId) -> Vec<WindowId> {
        let mut out = Vec::new();
        self.collect_windows_into(id, &mut out);
        out
    }

    fn collect_windows_into(&self, id: FrameId, out: &mut Vec<WindowId>) {
        let f = self.get(id);
        if let Some(w) = f.window {
            out.push(w);
        }
        if let Some((a, b)) = f.children {
            self.collect_windows_into(a, out);
            self.collect_windows_into(b, out);
        }
    }

    /// Every `(leaf, window)` pair in `id`'s subtree, used after a stash
    /// pop/fill to repoint each window's owning-frame field (a stashed
    /// subtree can carry more than one leaf window, not just a single one
    /// at its root -- spec.md §4.C "Stash").
    pub fn collect_leaf_windows(&self, id: FrameId) -> Vec<(FrameId, WindowId)> {
        let mut out = Vec::new();
        self.collect_leaf_windows_into(id, &mut out);
        out
    }

    fn collect_leaf_windows_into(&self, id: FrameId, out: &mut Vec<(FrameId, WindowId)>) {
        let f = self.get(id);
        match f.children {
            None => {
                if let Some(w) = f.window {
                    out.push((id, w));
                }
            }
            Some((a, b)) => {
                self.collect_leaf_windows_into(a, out);
                self.collect_leaf_windows_into(b, out);
            }
        }
    }

    /// Every `(leaf, window)` pair reachable from any visible monitor
    /// root or the stash. A structural edit (`split`, `remove`,
    /// `exchange`, the `move` wrap/void-replace paths, stash push/pop)
    /// can migrate a leaf's content onto a different `FrameId` than the
    /// one its window's `frame` back-pointer still names; re-deriving
    /// the whole correspondence from the tree after such an edit is
    /// simpler and less error-prone than threading a fixup through every
    /// call site (spec.md §3 W1: "a tiling window is referenced from
    /// exactly one frame leaf").
    #[must_use]
    pub fn all_tiling_leaf_windows(&self, monitor_roots: &[FrameId]) -> Vec<(FrameId, WindowId)> {
        let mut out = Vec::new();
        for &root in monitor_roots {
            self.collect_leaf_windows_into(root, &mut out);
        }
        let mut stash = self.stash_head;
        while let Some(id) = stash {
            self.collect_leaf_windows_into(id, &mut out);
            stash = self.get(id).stash_next;
        }
        out
    }

    /// Pops the stash head, skipping entries whose entire subtree has
    /// become empty and unnumbered (`is_alive` reports whether a window
    /// id still refers to a live X window). Returns the popped frame
    /// and the windows it carries (caller reloads/shows them).
    pub fn pop(&mut self, is_alive: impl Fn(WindowId) -> bool) -> Option<(FrameId, Vec<WindowId>)> {
        loop {
            let head = self.stash_head?;
            self.prune_dead_windows(head, &is_alive);
            if self.get(head).is_void() && self.get(head).number == 0 {
                self.stash_head = self.get(head).stash_next;
                self.decref(head);
                continue;
            }
            self.stash_head = self.get(head).stash_next;
            self.get_mut(head).stash_next = None;
            let windows = self.collect_windows(head);
            return Some((head, windows));
        }
    }

    fn prune_dead_windows(&mut self, id: FrameId, is_alive: &impl Fn(WindowId) -> bool) {
        if let Some(w) = self.get(id).window {
            if !is_alive(w) {
                self.get_mut(id).window = None;
            }
        }
        if let Some((a, b)) = self.get(id).children {
            self.prune_dead_windows(a, is_alive);
            self.prune_dead_windows(b, is_alive);
        }
    }

    /// Fills `frame` (which must be a void) with the content of a popped
    /// stash entry.
    pub fn fill_void_with_stash(&mut self, frame: FrameId, stashed: FrameId) -> Result<()> {
        if !self.get(frame).is_void() {
            return Err(Error::Invariant("fill_void_with_stash target is not a void"));
        }
        let content = self.take_content(stashed);
        self.place_content(frame, content);
        self.decref(stashed);
        Ok(())
    }

    #[must_use]
    pub fn stash_head(&self) -> Option<FrameId> {
        self.stash_head
    }

    /// All numbers currently in use, visible or stashed (I4).
    pub fn numbers_in_use(&self, monitor_roots: &[FrameId]) -> Vec<u32> {
        let mut out = Vec::new();
        for &root in monitor_roots {
            self.collect_numbers(root, &mut out);
        }
        let mut stash = self.stash_head;
        while let Some(id) = stash {
            self.collect_numbers(id, &mut out);
            stash = self.get(id).stash_next;
        }
        out
    }

    fn collect_numbers(&self, id: FrameId, out: &mut Vec<u32>) {
        let f = self.get(id);
        if f.number != 0 {
            out.push(f.number);
        }
        if let Some((a, b)) = f.children {
            self.collect_numbers(a, out);
            self.collect_numbers(b, out);
        }
    }

    /// Clears `number` from whichever frame (visible or stashed) holds
    /// it, then assigns it to `frame` (spec.md §4.E `assign I`).
    pub fn assign_number(&mut self, frame: FrameId, number: u32, monitor_roots: &[FrameId]) {
        if number != 0 {
            for &root in monitor_roots {
                self.clear_number(root, number);
            }
            let mut stash = self.stash_head;
            while let Some(id) = stash {
                self.clear_number(id, number);
                stash = self.get(id).stash_next;
            }
        }
        self.get_mut(frame).number = number;
    }

    fn clear_number(&mut self, id: FrameId, number: u32) {
        if self.get(id).number == number {
            self.get_mut(id).number = 0;
        }
        if let Some((a, b)) = self.get(id).children {
            self.clear_number(a, number);
            self.clear_number(b, number);
        }
    }

    /// Finds the first void leaf in `id`'s subtree, depth-first
    /// (spec.md §6 `auto find void`: prefer reusing an empty frame over
    /// splitting before placing a newly mapped tiling window).
    #[must_use]
    pub fn find_void_leaf(&self, id: FrameId) -> Option<FrameId> {
        let f = self.get(id);
        match f.children {
            None => f.is_void().then_some(id),
            Some((a, b)) => self.find_void_leaf(a).or_else(|| self.find_void_leaf(b)),
        }
    }

    /// Finds the frame with the given nonzero number among a set of
    /// visible roots, else in the stash.
    pub fn find_by_number(&self, number: u32, monitor_roots: &[FrameId]) -> Option<FrameId> {
        if number == 0 {
            return None;
        }
        for &root in monitor_roots {
            if let Some(id) = self.find_number_in(root, number) {
                return Some(id);
            }
        }
        let mut stash = self.stash_head;
        while let Some(id) = stash {
            if let Some(found) = self.find_number_in(id, number) {
                return Some(found);
            }
            stash = self.get(id).stash_next;
        }
        None
    }

    fn find_number_in(&self, id: FrameId, number: u32) -> Option<FrameId> {
        let f = self.get(id);
        if f.number == number {
            return Some(id);
        }
        if let Some((a, b)) = f.children {
            return self.find_number_in(a, number).or_else(|| self.find_number_in(b, number));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaps_zero() -> Gaps {
        Gaps::default()
    }

    #[test]
    fn scenario_1_split_split_equalize() {
        let mut arena = FrameArena::new();
        let root_rect = Rectangle::new(0, 0, 800, 600);
        let root = arena.new_root(MonitorId(0), root_rect);

        let (left, right) = arena.split(root, SplitDirection::Horizontal, true);
        let (_top, _bottom) = arena.split(left, SplitDirection::Vertical, true);
        arena.equalize(root, SplitDirection::Horizontal);
        arena.equalize(root, SplitDirection::Vertical);

        let mut out = Vec::new();
        arena.resize(root, root_rect, root_rect, &gaps_zero(), 0, &mut out);

        assert_eq!(arena.get(left).rect, Rectangle::new(0, 0, 400, 600));
        assert_eq!(arena.get(right).rect, Rectangle::new(400, 0, 400, 600));
        let (top, bottom) = arena.get(left).children.unwrap();
        assert_eq!(arena.get(top).rect, Rectangle::new(0, 0, 400, 300));
        assert_eq!(arena.get(bottom).rect, Rectangle::new(0, 300, 400, 300));
    }

    #[test]
    fn split_then_remove_restores_shape() {
        let mut arena = FrameArena::new();
        let rect = Rectangle::new(0, 0, 800, 600);
        let root = arena.new_root(MonitorId(0), rect);
        arena.get_mut(root).number = 7;
        let (new_id, other_id) = arena.split(root, SplitDirection::Horizontal, true);
        assert_eq!(arena.get(root).number, 0);
        assert_eq!(arena.get(new_id).number, 7);

        let (back, removed_window) = arena.remove(new_id).unwrap();
        assert_eq!(back, root);
        assert_eq!(removed_window, None);
        assert_eq!(arena.get(root).number, 7);
        assert!(arena.get(root).is_leaf());
        let _ = other_id;
    }

    #[test]
    fn move_left_from_leftmost_leaf_returns_false() {
        let mut arena = FrameArena::new();
        let rect = Rectangle::new(0, 0, 800, 600);
        let root = arena.new_root(MonitorId(0), rect);
        assert!(!arena.move_towards(root, Direction::Left, None));
    }

    #[test]
    fn bump_edge_saturates_at_minimum() {
        let mut arena = FrameArena::new();
        let rect = Rectangle::new(0, 0, 100, 600);
        let root = arena.new_root(MonitorId(0), rect);
        let (left, _right) = arena.split(root, SplitDirection::Horizontal, true);
        let mut out = Vec::new();
        arena.resize(root, rect, rect, &gaps_zero(), 0, &mut out);

        let applied = arena.bump_edge(left, Edge::Right, -1000);
        assert_eq!(applied, -(50 - FRAME_RESIZE_MINIMUM_SIZE as i32));
    }

    #[test]
    fn pop_empty_stash_returns_none() {
        let mut arena = FrameArena::new();
        assert!(arena.pop(|_| true).is_none());
    }

    #[test]
    fn stash_then_pop_restores_number_and_window() {
        let mut arena = FrameArena::new();
        let rect = Rectangle::new(0, 0, 800, 600);
        let root = arena.new_root(MonitorId(0), rect);
        arena.get_mut(root).window = Some(WindowId(3));
        arena.get_mut(root).number = 9;

        let windows = arena.stash_later(root);
        assert_eq!(windows, vec![WindowId(3)]);

        let (popped, popped_windows) = arena.pop(|_| true).unwrap();
        assert_eq!(popped, root);
        assert_eq!(popped_windows, vec![WindowId(3)]);
        assert_eq!(arena.get(root).number, 9);
    }
}
