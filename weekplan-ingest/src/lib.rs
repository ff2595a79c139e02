//! weekplan-ingest: markdown project and routine files into engine inputs.

pub mod frontmatter;
pub mod loader;
pub mod parsers;

pub use loader::{is_routine_file, load_dir, load_files, load_paths, ParsedInputs};
pub use parsers::project::parse_project;
pub use parsers::routine::parse_routine;
