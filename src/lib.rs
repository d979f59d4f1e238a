#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod text_metrics;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use ir::{People, PeopleBuilder, Person, Sex};
pub use layout::{Layout, compute_layout};
pub use parser::{ParseError, parse_people};
