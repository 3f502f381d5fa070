pub mod loaders;
pub mod order;
pub mod part;

pub use loaders::{download_orders_csv, load_orders, parse_orders};
pub use order::OrderRow;
