pub mod format;
pub mod models;
pub mod price;

// 重新导出常用类型和函数，方便直接使用
pub use format::{escape_html, Alert, AlertKind, Formatter};
pub use models::{Characteristic, FilterControl, ProductEntry, ALL_SENTINEL};
pub use price::{parse_number, parse_price};
