//! Toolbar: buttons, column visibility menus and column moves.

mod buttons;
mod menu;
mod order;

pub use buttons::{
    ButtonKind, HiddenFilter, HiddenFilterWarning, TREE_LEVELS, Toolbar, ToolbarButton, ToolbarConfig,
};
pub use menu::{ColumnMenu, MenuEntry, MenuKind};
pub use order::array_change_position;
