pub mod fit;
pub mod lm;
pub mod model;

pub use fit::{fit_psf, fit_psfs, psf_radius};
pub use model::{PsfConfig, PsfFit, PsfModel, PsfStatus};
