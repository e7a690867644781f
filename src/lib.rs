//! Cascading configuration loader.
//!
//! Loads an ordered list of configuration files of mixed formats into one
//! settings store, following `include` directives, expanding variable
//! references and reporting which referenced settings the cascade never
//! defined (its "externals").
//!
//! ```no_run
//! use config_cascade::loader::Loader;
//! use config_cascade::settings::NestedSettings;
//!
//! let mut loader = Loader::new(
//!     ["/etc/app/defaults.json", "/etc/app/local.conf"],
//!     NestedSettings::new(),
//! );
//! loader.load()?;
//! for name in loader.externals() {
//!     println!("must be supplied externally: {name}");
//! }
//! # Ok::<(), config_cascade::error::CascadeError>(())
//! ```

pub mod deps;
pub mod editor;
pub mod error;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod parser;
pub mod paths;
pub mod settings;
