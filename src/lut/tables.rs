use super::{LutError, AOT_GRID, NAOT_VALS};

/// Per-band gas transmittance and Rayleigh constants for the legacy kernel.
#[derive(Debug, Clone)]
pub struct BandGasCoefficients {
    /// Molecular (Rayleigh) optical thickness at standard pressure.
    pub tauray: f64,
    pub ogtransa1: f64,
    pub ogtransb0: f64,
    pub ogtransb1: f64,
    pub wvtransa: f64,
    pub wvtransb: f64,
    pub oztransa: f64,
}

/// Radiative-transfer tables for the traditional retrieval path.
///
/// The table layout follows the generating runs: `rolutt` is indexed
/// `[band][pressure][aot][scattering]` where the scattering dimension packs
/// the azimuth sweep of every (view zenith, solar zenith) cell; `tsmin`,
/// `tsmax`, `nbfi` and `nbfic` locate a scattering angle inside that packed
/// dimension. `transt` is `[band][pressure][aot][sun angle]`, `sphalbt` and
/// `normext` are `[band][pressure][aot]`. All tables are immutable after
/// scene load and shared read-only between workers.
#[derive(Debug)]
pub struct LegacyLutTables {
    nbands: usize,
    tpres: Vec<f64>,
    tts: Vec<f64>,
    xtv_min: f64,
    xtv_step: f64,
    nview: usize,
    nsolar: usize,
    rolutt: Vec<f32>,
    transt: Vec<f32>,
    sphalbt: Vec<f32>,
    normext: Vec<f32>,
    tsmax: Vec<f32>,
    tsmin: Vec<f32>,
    nbfic: Vec<f32>,
    nbfi: Vec<f32>,
    gas: Vec<BandGasCoefficients>,
}

impl LegacyLutTables {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nbands: usize,
        tpres: Vec<f64>,
        tts: Vec<f64>,
        xtv_min: f64,
        xtv_step: f64,
        nview: usize,
        nsolar: usize,
        rolutt: Vec<f32>,
        transt: Vec<f32>,
        sphalbt: Vec<f32>,
        normext: Vec<f32>,
        tsmax: Vec<f32>,
        tsmin: Vec<f32>,
        nbfic: Vec<f32>,
        nbfi: Vec<f32>,
        gas: Vec<BandGasCoefficients>,
    ) -> Result<Self, LutError> {
        let npres = tpres.len();
        let ntts = tts.len();

        check_len("rolutt", rolutt.len(), nbands * npres * NAOT_VALS * nsolar)?;
        check_len("transt", transt.len(), nbands * npres * NAOT_VALS * ntts)?;
        check_len("sphalbt", sphalbt.len(), nbands * npres * NAOT_VALS)?;
        check_len("normext", normext.len(), nbands * npres * NAOT_VALS)?;
        check_len("tsmax", tsmax.len(), nview * ntts)?;
        check_len("tsmin", tsmin.len(), nview * ntts)?;
        check_len("nbfic", nbfic.len(), nview * ntts)?;
        check_len("nbfi", nbfi.len(), nview * ntts)?;
        check_len("gas", gas.len(), nbands)?;

        Ok(LegacyLutTables {
            nbands,
            tpres,
            tts,
            xtv_min,
            xtv_step,
            nview,
            nsolar,
            rolutt,
            transt,
            sphalbt,
            normext,
            tsmax,
            tsmin,
            nbfic,
            nbfi,
            gas,
        })
    }

    pub fn band_count(&self) -> usize {
        self.nbands
    }

    pub fn gas(&self, ib: usize) -> &BandGasCoefficients {
        &self.gas[ib]
    }

    fn check_band(&self, ib: usize) -> Result<(), LutError> {
        if ib >= self.nbands {
            return Err(LutError::Band {
                requested: ib,
                available: self.nbands,
            });
        }
        Ok(())
    }

    /// Reads one tabulated value, reporting a read failure for fill values
    /// the loader left behind or positions outside the packed dimension.
    fn node(&self, table: &'static str, data: &[f32], index: usize) -> Result<f64, LutError> {
        match data.get(index) {
            Some(v) if v.is_finite() => Ok(*v as f64),
            _ => Err(LutError::MissingNode { table, index }),
        }
    }

    /// Spherical albedo interpolated over pressure and AOT.
    pub fn spherical_albedo(&self, ib: usize, pres: f64, aot550: f64) -> Result<f64, LutError> {
        self.check_band(ib)?;
        self.pres_aot("sphalbt", &self.sphalbt, ib, pres, aot550)
    }

    /// Aerosol extinction at the band wavelength, normalised at 550 nm,
    /// interpolated over pressure and AOT.
    pub fn normalized_extinction(
        &self,
        ib: usize,
        pres: f64,
        aot550: f64,
    ) -> Result<f64, LutError> {
        self.check_band(ib)?;
        self.pres_aot("normext", &self.normext, ib, pres, aot550)
    }

    fn pres_aot(
        &self,
        table: &'static str,
        data: &[f32],
        ib: usize,
        pres: f64,
        aot550: f64,
    ) -> Result<f64, LutError> {
        let npres = self.tpres.len();
        let (ip, rp) = bracket(&self.tpres, pres);
        let (ia, ra) = bracket(&AOT_GRID, aot550);

        let mut value = 0.0;
        for k in 0..=1 {
            let kp = (ip + k).min(npres - 1);
            let wp = if k == 0 { 1.0 - rp } else { rp };
            for l in 0..=1 {
                let la = (ia + l).min(NAOT_VALS - 1);
                let wa = if l == 0 { 1.0 - ra } else { ra };
                value += wp * wa * self.node(table, data, (ib * npres + kp) * NAOT_VALS + la)?;
            }
        }
        Ok(value)
    }

    /// One-way atmospheric transmittance at the given zenith angle,
    /// interpolated over pressure, AOT and the sun-angle axis.
    pub fn transmittance(
        &self,
        ib: usize,
        pres: f64,
        aot550: f64,
        zenith: f64,
    ) -> Result<f64, LutError> {
        self.check_band(ib)?;
        let npres = self.tpres.len();
        let ntts = self.tts.len();
        let (ip, rp) = bracket(&self.tpres, pres);
        let (ia, ra) = bracket(&AOT_GRID, aot550);
        let (it, rt) = bracket(&self.tts, zenith);

        let mut value = 0.0;
        for k in 0..=1 {
            let kp = (ip + k).min(npres - 1);
            let wp = if k == 0 { 1.0 - rp } else { rp };
            for l in 0..=1 {
                let la = (ia + l).min(NAOT_VALS - 1);
                let wa = if l == 0 { 1.0 - ra } else { ra };
                for m in 0..=1 {
                    let mt = (it + m).min(ntts - 1);
                    let wt = if m == 0 { 1.0 - rt } else { rt };
                    let index = ((ib * npres + kp) * NAOT_VALS + la) * ntts + mt;
                    value += wp * wa * wt * self.node("transt", &self.transt, index)?;
                }
            }
        }
        Ok(value)
    }

    /// Intrinsic atmospheric reflectance for the given geometry,
    /// interpolated over pressure, AOT, view zenith, solar zenith and the
    /// packed scattering dimension.
    pub fn intrinsic_reflectance(
        &self,
        ib: usize,
        pres: f64,
        aot550: f64,
        solar_zenith: f64,
        view_zenith: f64,
        scattering_angle: f64,
    ) -> Result<f64, LutError> {
        self.check_band(ib)?;
        let npres = self.tpres.len();
        let ntts = self.tts.len();
        let (ip, rp) = bracket(&self.tpres, pres);
        let (ia, ra) = bracket(&AOT_GRID, aot550);
        let (its, rs) = bracket(&self.tts, solar_zenith);
        let (itv, rv) = self.view_bracket(view_zenith);

        // Remove the scattering dimension for each view/sun corner first,
        // then collapse pressure and AOT, leaving a 2x2 angular cell.
        let mut cell = [[0.0f64; 2]; 2];
        for i in 0..=1 {
            let iv = (itv + i).min(self.nview - 1);
            for j in 0..=1 {
                let is = (its + j).min(ntts - 1);
                let ang = iv * ntts + is;
                let smin = self.node("tsmin", &self.tsmin, ang)?;
                let smax = self.node("tsmax", &self.tsmax, ang)?;
                let nfi = self.node("nbfi", &self.nbfi, ang)?;
                let nfic = self.node("nbfic", &self.nbfic, ang)?;

                // Fractional position of the scattering angle inside this
                // cell's azimuth sweep of the packed dimension.
                let frac = if smax > smin {
                    ((scattering_angle - smin) / (smax - smin)).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let pos = (nfic - nfi + frac * (nfi - 1.0)).max(0.0);
                let is0 = pos.floor() as usize;
                let is1 = is0 + 1;
                let rpos = pos - pos.floor();

                let mut acc = 0.0;
                for k in 0..=1 {
                    let kp = (ip + k).min(npres - 1);
                    let wp = if k == 0 { 1.0 - rp } else { rp };
                    for l in 0..=1 {
                        let la = (ia + l).min(NAOT_VALS - 1);
                        let wa = if l == 0 { 1.0 - ra } else { ra };
                        let base = ((ib * npres + kp) * NAOT_VALS + la) * self.nsolar;
                        let lo = self.node("rolutt", &self.rolutt, base + is0)?;
                        let hi = if rpos > 0.0 {
                            self.node("rolutt", &self.rolutt, base + is1)?
                        } else {
                            lo
                        };
                        acc += wp * wa * ((1.0 - rpos) * lo + rpos * hi);
                    }
                }
                cell[i][j] = acc;
            }
        }

        // Remove the solar zenith dimension, then the view zenith.
        let lo = (1.0 - rs) * cell[0][0] + rs * cell[0][1];
        let hi = (1.0 - rs) * cell[1][0] + rs * cell[1][1];
        Ok((1.0 - rv) * lo + rv * hi)
    }

    fn view_bracket(&self, view_zenith: f64) -> (usize, f64) {
        if self.nview < 2 || self.xtv_step <= 0.0 {
            return (0, 0.0);
        }
        let t = (view_zenith - self.xtv_min) / self.xtv_step;
        if t <= 0.0 {
            return (0, 0.0);
        }
        let top = (self.nview - 1) as f64;
        if t >= top {
            return (self.nview - 2, 1.0);
        }
        let idx = t.floor() as usize;
        (idx, t - t.floor())
    }
}

fn check_len(table: &'static str, actual: usize, expected: usize) -> Result<(), LutError> {
    if actual != expected {
        return Err(LutError::Dimension {
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Bracketing indices along an increasing axis, with boundary clamping: a
/// target below the axis sticks to the first interval, above it to the
/// last. Returns the lower index and the fractional distance to the next
/// node.
fn bracket(axis: &[f64], target: f64) -> (usize, f64) {
    if axis.len() < 2 || target <= axis[0] {
        return (0, 0.0);
    }
    let last = axis.len() - 1;
    if target >= axis[last] {
        return (last - 1, 1.0);
    }

    let mut idx = 0;
    for i in 0..last {
        if target >= axis[i] && target < axis[i + 1] {
            idx = i;
            break;
        }
    }
    (idx, (target - axis[idx]) / (axis[idx + 1] - axis[idx]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // One band, two pressure levels, three sun angles, two view angles.
    // The packed scattering dimension has one entry per sun angle so the
    // angular tables can address it directly.
    fn synthetic_tables() -> LegacyLutTables {
        let nbands = 1;
        let tpres = vec![700.0, 1013.0];
        let tts = vec![0.0, 30.0, 60.0];
        let nview = 2;
        let nsolar = 3;
        let npres = tpres.len();
        let ntts = tts.len();

        // rolutt grows linearly with the AOT index so interpolation along
        // the AOT axis is exactly linear.
        let mut rolutt = vec![0.0f32; nbands * npres * NAOT_VALS * nsolar];
        for ip in 0..npres {
            for ia in 0..NAOT_VALS {
                for is in 0..nsolar {
                    rolutt[(ip * NAOT_VALS + ia) * nsolar + is] = 0.01 + 0.002 * ia as f32;
                }
            }
        }
        let transt = vec![0.9f32; nbands * npres * NAOT_VALS * ntts];
        let sphalbt = vec![0.1f32; nbands * npres * NAOT_VALS];
        let normext = vec![1.0f32; nbands * npres * NAOT_VALS];

        // Each angular cell spans the full scattering range with a single
        // azimuth entry located at the sun-angle index.
        let tsmax = vec![180.0f32; nview * ntts];
        let tsmin = vec![0.0f32; nview * ntts];
        let mut nbfic = vec![0.0f32; nview * ntts];
        let nbfi = vec![1.0f32; nview * ntts];
        for iv in 0..nview {
            for is in 0..ntts {
                nbfic[iv * ntts + is] = (is + 1) as f32;
            }
        }

        let gas = vec![BandGasCoefficients {
            tauray: 0.23,
            ogtransa1: 4.2e-4,
            ogtransb0: 0.58,
            ogtransb1: -0.058,
            wvtransa: 2.9e-3,
            wvtransb: 0.69,
            oztransa: 0.085,
        }];

        LegacyLutTables::new(
            nbands, tpres, tts, 0.0, 30.0, nview, nsolar, rolutt, transt, sphalbt, normext,
            tsmax, tsmin, nbfic, nbfi, gas,
        )
        .unwrap()
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let result = LegacyLutTables::new(
            1,
            vec![1013.0],
            vec![0.0, 30.0],
            0.0,
            30.0,
            1,
            2,
            vec![0.0; 3], // wrong size for rolutt
            vec![0.0; NAOT_VALS * 2],
            vec![0.0; NAOT_VALS],
            vec![0.0; NAOT_VALS],
            vec![0.0; 2],
            vec![0.0; 2],
            vec![0.0; 2],
            vec![0.0; 2],
            vec![],
        );
        match result {
            Err(LutError::Dimension { table, .. }) => assert_eq!(table, "rolutt"),
            other => panic!("expected dimension error, got {:?}", other),
        }
    }

    #[test]
    fn test_bracket_clamps_to_axis_bounds() {
        let axis = [700.0, 850.0, 1013.0];
        assert_eq!(bracket(&axis, 500.0), (0, 0.0));
        assert_eq!(bracket(&axis, 1100.0), (1, 1.0));
        let (idx, r) = bracket(&axis, 775.0);
        assert_eq!(idx, 0);
        assert_relative_eq!(r, 0.5);
    }

    #[test]
    fn test_spherical_albedo_constant_table() {
        let lut = synthetic_tables();
        let satm = lut.spherical_albedo(0, 900.0, 0.35).unwrap();
        assert_relative_eq!(satm, 0.1, max_relative = 1e-6);
    }

    #[test]
    fn test_intrinsic_reflectance_linear_in_aot() {
        let lut = synthetic_tables();
        // Halfway between grid indices 4 (0.2) and 5 (0.3).
        let mid = lut
            .intrinsic_reflectance(0, 1013.0, 0.25, 30.0, 15.0, 90.0)
            .unwrap();
        let lo = lut
            .intrinsic_reflectance(0, 1013.0, 0.2, 30.0, 15.0, 90.0)
            .unwrap();
        let hi = lut
            .intrinsic_reflectance(0, 1013.0, 0.3, 30.0, 15.0, 90.0)
            .unwrap();
        assert_relative_eq!(mid, 0.5 * (lo + hi), max_relative = 1e-5);
    }

    #[test]
    fn test_out_of_range_pressure_is_clamped() {
        let lut = synthetic_tables();
        let inside = lut.transmittance(0, 700.0, 0.1, 20.0).unwrap();
        let below = lut.transmittance(0, 400.0, 0.1, 20.0).unwrap();
        assert_relative_eq!(inside, below, max_relative = 1e-9);
    }

    #[test]
    fn test_missing_node_is_reported() {
        let mut lut = synthetic_tables();
        lut.sphalbt[0] = f32::NAN;
        match lut.spherical_albedo(0, 600.0, 0.01) {
            Err(LutError::MissingNode { table, .. }) => assert_eq!(table, "sphalbt"),
            other => panic!("expected missing node, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_band_is_rejected() {
        let lut = synthetic_tables();
        assert!(matches!(
            lut.spherical_albedo(3, 1013.0, 0.1),
            Err(LutError::Band { requested: 3, .. })
        ));
    }
}
