//! Game pack loading: RON schema, name resolution, and the embedded base
//! content.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, GamePack, load_path, load_str};

/// The default game content, embedded at compile time.
pub fn base_pack() -> Result<GamePack, DataLoadError> {
    load_str(include_str!("../data/base.ron"))
}
