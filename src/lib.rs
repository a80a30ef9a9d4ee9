pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{http::PokeApiClient, storage::LocalStorage};
pub use config::{toml_config::TomlConfig, CliConfig};
pub use core::{etl::EtlEngine, pipeline::PokemonPipeline};
pub use utils::error::{EtlError, FetchError, Result};
