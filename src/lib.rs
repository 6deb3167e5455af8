//! Aerosol retrieval and Lambertian atmospheric correction for Landsat-8/9
//! and Sentinel-2 surface reflectance processing.
//!
//! Given TOA reflectances for the reflective bands of a pixel and the
//! atmospheric coefficient tables of the scene, the crate searches the
//! AOT-550 nm grid for the aerosol loading that best reconciles the
//! observed inter-band ratios with the radiative-transfer model, and
//! reports the retrieved AOT together with the model residual.

pub mod aerosol;
pub mod config;
pub mod correction;
pub mod lut;
pub mod satellite;

pub use aerosol::{AerosolRetriever, PixelInputs, RetrievalResult, ScenePixel, SceneProcessor};
pub use config::{Config, ConfigError};
pub use correction::{
    Atmosphere, Geometry, LambertianKernel, LegacyCorrection, LegacyKernel, SemiEmpiricalKernel,
    ViewingConditions,
};
pub use lut::{
    BandCoefficients, BandGasCoefficients, CoefficientStore, LegacyLutTables, LutError, AOT_GRID,
    NAOT_VALS,
};
pub use satellite::{BandPolicy, Satellite};
