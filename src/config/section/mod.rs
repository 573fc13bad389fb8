//! Configuration section definitions.
//!
//! Each module corresponds to a section in `cdnpush.toml`:
//!
//! | Module     | TOML Section   | Purpose                                  |
//! |------------|----------------|------------------------------------------|
//! | `cdn`      | `[cdn]`        | Master switch, size limit, parallelism   |
//! | `paths`    | `[paths]`      | URL prefixes and their local roots       |
//! | `split`    | `[split]`      | Script splitting thresholds and loaders  |
//! | `webp`     | `[webp]`       | WebP variant derivation                  |
//! | `store`    | `[store]`      | Remote content store (GitHub, local dir) |
//! | `manifest` | `[manifest]`   | Split manifest location                  |

mod cdn;
mod manifest;
mod paths;
mod split;
mod store;
mod webp;

pub use cdn::CdnSectionConfig;
pub use manifest::ManifestConfig;
pub use paths::PathsConfig;
pub use split::SplitConfig;
pub use store::{GithubStoreConfig, LocalStoreConfig, StoreConfig, StoreProvider};
pub use webp::WebpConfig;
