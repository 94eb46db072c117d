pub mod item;
pub mod line;
pub mod subroutine;

pub use item::{lower, Disassembly, Item, ItemKind};
pub use line::{DisassemblyLine, Fragment, FragmentKind, LineKind};
pub use subroutine::{filter_subroutines, Meta, Subroutine};
