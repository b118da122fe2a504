//! Configuration section definitions.
//!
//! Each module corresponds to a section in `strokesync.toml`:
//!
//! | Module    | TOML Section                   | Purpose                          |
//! |-----------|--------------------------------|----------------------------------|
//! | `remote`  | `[remote]` `[auth]` `[client]` | Store endpoint, identity, naming |
//! | `watch`   | `[watch]`                      | Watched stroke file              |
//! | `surface` | `[surface]`                    | Geometry for new surfaces        |
//! | `engine`  | `[engine]`                     | Rendering engine process         |

mod engine;
mod remote;
mod surface;
mod watch;

pub use engine::EngineConfig;
pub use remote::{AuthConfig, ClientConfig, RemoteConfig};
pub use surface::SurfaceConfig;
pub use watch::WatchConfig;
