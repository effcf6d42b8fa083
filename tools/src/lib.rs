extern crate gltf;
extern crate itertools;
#[macro_use]
extern crate lazy_static;
extern crate lexical_sort;
extern crate regex;
extern crate serde;
extern crate serde_json;
extern crate toml;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;
extern crate unicode_normalization;

pub mod file_format;

pub mod gltf_loader;
pub mod logging;
pub mod normalize;
pub mod resolver;
pub mod scene_graph;
pub mod sidebar;
pub mod spec_sheet;
pub mod tree;
pub mod visibility;
