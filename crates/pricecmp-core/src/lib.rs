pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod comparator;
pub mod config;
pub mod error;
pub mod grouper;
pub mod memory;
pub mod normalize;
pub mod prices;
pub mod repository;
pub mod service;

pub use app_config::{AppConfig, Environment};
pub use cart::{CartItem, CartTotal, ComparisonResult, ItemSelection};
pub use catalog::{load_catalog, CatalogFile, ChainConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, RepositoryError, ServiceError, ValidationError};
pub use grouper::{group_rows, GroupedProducts};
pub use memory::InMemoryPriceRepository;
pub use normalize::{is_barcode, normalize_city, normalize_query, CityAliases, SearchQuery};
pub use prices::{PriceEntry, PriceRow, PriceStats, Product};
pub use repository::PriceRepository;
pub use service::{compare_cart, product_by_barcode, search_products};
