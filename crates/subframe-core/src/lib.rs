pub mod batch;
pub mod config;
pub mod consts;
pub mod detection;
pub mod error;
pub mod filters;
pub mod frame;
pub mod io;
pub mod measure;
pub mod psf;
pub mod stats;
pub mod wavelet;
