pub mod config;
pub mod scanner;
pub mod star;
pub mod structure;

pub use config::DetectorConfig;
pub use scanner::find_stars;
pub use star::Star;
pub use structure::{
    build_structure_map, detect_stars, detection_image, structure_maps, StructureMaps,
};
