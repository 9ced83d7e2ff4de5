pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, success, warn};
pub use table::{TableBuilder, device_table, group_table, setting_table, stats_table};
pub use theme::{theme, ColorChoice, Theme};
