pub mod csv_loader;

pub use csv_loader::{download_orders_csv, load_orders, parse_orders};
