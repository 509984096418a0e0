//! Arena index types.
//!
//! DESIGN NOTES (spec.md §9) calls for modeling the frame tree's and the
//! window model's cyclic pointer graphs as arenas of typed indices rather
//! than `Rc`/`RefCell` graphs. These newtypes are the indices; the arenas
//! themselves live in `frame`, `window` and `monitor`.

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(FrameId);
arena_id!(WindowId);
arena_id!(MonitorId);
