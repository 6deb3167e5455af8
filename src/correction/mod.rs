//! Lambertian atmospheric correction of one band at one pixel.
//!
//! Both kernels invert the same equation: the gas-corrected TOA reflectance
//! `y = troatm/tgo - roatm` maps to the surface through
//! `roslamb = y / (ttatmg + satm * y)`. They differ in where the
//! atmospheric terms come from: the semi-empirical kernel evaluates
//! per-band polynomial fits, the legacy kernel interpolates the full
//! radiative-transfer tables.

use std::sync::Arc;

use crate::lut::{CoefficientStore, LegacyLutTables, LutError, AOT_GRID};

/// Standard surface pressure in hPa used to normalise the pressure axis.
const STANDARD_PRESSURE: f64 = 1013.0;

/// Floor applied to the Lambertian denominator. Very bright pixels at
/// large AOT can drive `ttatmg + satm * y` through zero; the floored value
/// keeps the output finite and the plausibility thresholds reject the
/// pixel downstream.
const DENOM_EPS: f64 = 1e-12;

/// Sun/view geometry for one pixel, angles in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub solar_zenith: f64,
    pub view_zenith: f64,
    pub relative_azimuth: f64,
}

impl Geometry {
    pub fn cos_solar(&self) -> f64 {
        self.solar_zenith.to_radians().cos()
    }

    pub fn cos_view(&self) -> f64 {
        self.view_zenith.to_radians().cos()
    }

    /// Two-way airmass `1/cos(ts) + 1/cos(tv)`.
    pub fn airmass(&self) -> f64 {
        1.0 / self.cos_solar() + 1.0 / self.cos_view()
    }

    /// Scattering angle in degrees between the incoming and outgoing rays.
    pub fn scattering_angle(&self) -> f64 {
        let xmus = self.cos_solar();
        let xmuv = self.cos_view();
        let sins = self.solar_zenith.to_radians().sin();
        let sinv = self.view_zenith.to_radians().sin();
        let cscaa =
            -xmus * xmuv - self.relative_azimuth.to_radians().cos() * sins * sinv;
        cscaa.clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Column atmosphere for one pixel: surface pressure in hPa, total column
/// ozone in atm-cm, precipitable water vapour in g/cm^2.
#[derive(Debug, Clone, Copy)]
pub struct Atmosphere {
    pub pressure: f64,
    pub ozone: f64,
    pub water_vapor: f64,
}

/// Per-pixel scalars the scene driver hands the legacy kernel.
#[derive(Debug, Clone, Copy)]
pub struct ViewingConditions {
    pub geometry: Geometry,
    pub atmosphere: Atmosphere,
}

/// A correction kernel usable by the aerosol retriever.
pub trait LambertianKernel {
    /// Lambertian surface reflectance of `band` at the AOT-550 nm
    /// candidate, for the observed TOA reflectance `troatm`.
    fn surface_reflectance(
        &self,
        band: usize,
        aot550: f64,
        view: &ViewingConditions,
        troatm: f64,
        eps: f64,
    ) -> Result<f64, LutError>;
}

/// Kernel backed by the per-band polynomial fits. Infallible.
#[derive(Debug, Clone)]
pub struct SemiEmpiricalKernel {
    store: Arc<CoefficientStore>,
}

impl SemiEmpiricalKernel {
    pub fn new(store: Arc<CoefficientStore>) -> Self {
        SemiEmpiricalKernel { store }
    }

    pub fn store(&self) -> &CoefficientStore {
        &self.store
    }

    pub fn correct(&self, band: usize, aot550: f64, troatm: f64, eps: f64) -> f64 {
        let coef = self.store.band(band);
        // Clamp the candidate at the band's trusted grid value, then apply
        // the spectral dependency of the AOT: the band extinction
        // normalised at 550 nm raised to the Angstrom exponent, so eps = 1
        // reproduces the table's own spectral behaviour.
        let aot550 = aot550.min(AOT_GRID[coef.ia_max]);
        let aot_band = aot550 * coef.normext_p0a3.powf(eps);
        let (roatm, ttatmg, satm) = self.store.evaluate(band, aot_band);
        invert_lambertian(troatm, coef.tgo, roatm, ttatmg, satm)
    }
}

impl LambertianKernel for SemiEmpiricalKernel {
    fn surface_reflectance(
        &self,
        band: usize,
        aot550: f64,
        _view: &ViewingConditions,
        troatm: f64,
        eps: f64,
    ) -> Result<f64, LutError> {
        Ok(self.correct(band, aot550, troatm, eps))
    }
}

/// Full correction terms returned by the legacy kernel. The Rayleigh
/// reflectance is a diagnostic only; the retrieval does not consume it.
#[derive(Debug, Clone, Copy)]
pub struct LegacyCorrection {
    pub roslamb: f64,
    pub tgo: f64,
    pub roatm: f64,
    pub ttatmg: f64,
    pub satm: f64,
    pub rayleigh: f64,
}

/// Kernel backed by the traditional radiative-transfer tables.
#[derive(Debug, Clone)]
pub struct LegacyKernel {
    tables: Arc<LegacyLutTables>,
}

impl LegacyKernel {
    pub fn new(tables: Arc<LegacyLutTables>) -> Self {
        LegacyKernel { tables }
    }

    pub fn tables(&self) -> &LegacyLutTables {
        &self.tables
    }

    pub fn correct(
        &self,
        band: usize,
        aot550: f64,
        view: &ViewingConditions,
        troatm: f64,
        eps: f64,
    ) -> Result<LegacyCorrection, LutError> {
        let geom = &view.geometry;
        let atmos = &view.atmosphere;

        // Spectral dependency of the AOT at this band. This lookup also
        // validates the band index before the gas constants are touched.
        let normext = self
            .tables
            .normalized_extinction(band, atmos.pressure, aot550)?;
        let aot_band = aot550 * normext.powf(eps);

        let gas = self.tables.gas(band);
        let airmass = geom.airmass();
        let p = atmos.pressure / STANDARD_PRESSURE;

        let tgoz = (-gas.oztransa * atmos.ozone * airmass).exp();
        let tgwv = (-gas.wvtransa * (atmos.water_vapor * airmass).powf(gas.wvtransb)).exp();
        let tgog =
            (-(gas.ogtransa1 * p) * airmass.powf(gas.ogtransb0 + gas.ogtransb1 * p)).exp();
        let tgo = tgoz * tgwv * tgog;

        let scattering = geom.scattering_angle();
        let roatm = self.tables.intrinsic_reflectance(
            band,
            atmos.pressure,
            aot_band,
            geom.solar_zenith,
            geom.view_zenith,
            scattering,
        )?;
        let xtts = self
            .tables
            .transmittance(band, atmos.pressure, aot_band, geom.solar_zenith)?;
        let xttv = self
            .tables
            .transmittance(band, atmos.pressure, aot_band, geom.view_zenith)?;
        let satm = self.tables.spherical_albedo(band, atmos.pressure, aot_band)?;

        // Pressure-scaled single-scattering Rayleigh reflectance with the
        // molecular phase function.
        let cos_scatt = scattering.to_radians().cos();
        let phase = 0.75 * (1.0 + cos_scatt * cos_scatt);
        let rayleigh =
            gas.tauray * p * phase / (4.0 * geom.cos_solar() * geom.cos_view());

        let ttatmg = xtts * xttv;
        let roslamb = invert_lambertian(troatm, tgo, roatm, ttatmg, satm);

        Ok(LegacyCorrection {
            roslamb,
            tgo,
            roatm,
            ttatmg,
            satm,
            rayleigh,
        })
    }
}

impl LambertianKernel for LegacyKernel {
    fn surface_reflectance(
        &self,
        band: usize,
        aot550: f64,
        view: &ViewingConditions,
        troatm: f64,
        eps: f64,
    ) -> Result<f64, LutError> {
        Ok(self.correct(band, aot550, view, troatm, eps)?.roslamb)
    }
}

fn invert_lambertian(troatm: f64, tgo: f64, roatm: f64, ttatmg: f64, satm: f64) -> f64 {
    let y = troatm / tgo - roatm;
    let mut denom = ttatmg + satm * y;
    if denom.abs() < DENOM_EPS {
        denom = DENOM_EPS;
    }
    y / denom
}
