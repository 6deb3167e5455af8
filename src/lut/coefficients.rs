use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::{AOT_GRID, NAOT_VALS};

/// Number of polynomial coefficients per fitted atmospheric variable.
pub const NCOEF: usize = 5;

/// Semi-empirical fit for one band, valid for one scene geometry.
///
/// `roatm`, `ttatmg` and `satm` are coefficients of degree-4 polynomials in
/// AOT-550 nm for the intrinsic atmospheric reflectance, the two-way
/// transmittance (including other-gas absorption) and the spherical albedo.
/// `ia_max` is the AOT grid index past which the fits are no longer
/// trusted; evaluation is clamped there.
#[derive(Debug, Clone)]
pub struct BandCoefficients {
    pub tgo: f64,
    pub roatm: [f64; NCOEF],
    pub ttatmg: [f64; NCOEF],
    pub satm: [f64; NCOEF],
    pub normext_p0a3: f64,
    pub ia_max: usize,
}

/// Per-scene collection of band fits. Built once by the scene loader and
/// shared read-only with every retrieval worker.
#[derive(Debug)]
pub struct CoefficientStore {
    bands: Vec<BandCoefficients>,
}

// tgo + three polynomials + normext + clamp index
const VALUES_PER_BAND: usize = 3 + 3 * NCOEF;

impl CoefficientStore {
    pub fn new(mut bands: Vec<BandCoefficients>) -> Self {
        for band in &mut bands {
            if band.ia_max >= NAOT_VALS {
                band.ia_max = NAOT_VALS - 1;
            }
        }
        CoefficientStore { bands }
    }

    /// Reads one whitespace-separated record per band: tgo, the five
    /// `roatm` coefficients, five `ttatmg`, five `satm`, `normext_p0a3`,
    /// and the clamp index.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut values: Vec<f64> = Vec::new();
        for line in reader.lines() {
            let line = line?;
            for value_str in line.split_whitespace() {
                match value_str.parse::<f64>() {
                    Ok(value) => values.push(value),
                    Err(_) => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("unparseable coefficient value: {}", value_str),
                        ))
                    }
                }
            }
        }

        if values.is_empty() || values.len() % VALUES_PER_BAND != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "expected a multiple of {} values, found {}",
                    VALUES_PER_BAND,
                    values.len()
                ),
            ));
        }

        let mut bands = Vec::with_capacity(values.len() / VALUES_PER_BAND);
        for record in values.chunks(VALUES_PER_BAND) {
            let mut roatm = [0.0; NCOEF];
            let mut ttatmg = [0.0; NCOEF];
            let mut satm = [0.0; NCOEF];
            roatm.copy_from_slice(&record[1..1 + NCOEF]);
            ttatmg.copy_from_slice(&record[1 + NCOEF..1 + 2 * NCOEF]);
            satm.copy_from_slice(&record[1 + 2 * NCOEF..1 + 3 * NCOEF]);
            bands.push(BandCoefficients {
                tgo: record[0],
                roatm,
                ttatmg,
                satm,
                normext_p0a3: record[1 + 3 * NCOEF],
                ia_max: record[2 + 3 * NCOEF] as usize,
            });
        }

        Ok(CoefficientStore::new(bands))
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, ib: usize) -> &BandCoefficients {
        &self.bands[ib]
    }

    /// Evaluates the three fits at `aot550`, clamped at the band's trusted
    /// grid value so the polynomials are never extrapolated toward the top
    /// of the grid. Returns `(roatm, ttatmg, satm)`.
    pub fn evaluate(&self, ib: usize, aot550: f64) -> (f64, f64, f64) {
        let band = &self.bands[ib];
        let x = aot550.min(AOT_GRID[band.ia_max]);
        (
            polyval(&band.roatm, x),
            polyval(&band.ttatmg, x),
            polyval(&band.satm, x),
        )
    }
}

fn polyval(coef: &[f64; NCOEF], x: f64) -> f64 {
    coef.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::tempdir;

    fn constant_band(roatm: f64, ttatmg: f64, satm: f64) -> BandCoefficients {
        BandCoefficients {
            tgo: 1.0,
            roatm: [roatm, 0.0, 0.0, 0.0, 0.0],
            ttatmg: [ttatmg, 0.0, 0.0, 0.0, 0.0],
            satm: [satm, 0.0, 0.0, 0.0, 0.0],
            normext_p0a3: 1.0,
            ia_max: NAOT_VALS - 1,
        }
    }

    #[test]
    fn test_polyval_matches_direct_evaluation() {
        let coef = [0.5, -0.2, 0.03, 0.004, -0.0005];
        let x: f64 = 1.37;
        let direct = coef[0]
            + coef[1] * x
            + coef[2] * x.powi(2)
            + coef[3] * x.powi(3)
            + coef[4] * x.powi(4);
        assert_relative_eq!(polyval(&coef, x), direct, max_relative = 1e-14);
    }

    #[test]
    fn test_evaluate_clamps_at_trusted_grid_value() {
        let mut band = constant_band(0.0, 1.0, 0.0);
        band.roatm = [0.0, 0.1, 0.0, 0.0, 0.0];
        band.ia_max = 17; // grid value 3.0
        let store = CoefficientStore::new(vec![band]);

        let (at_five, _, _) = store.evaluate(0, 5.0);
        let (at_three, _, _) = store.evaluate(0, 3.0);
        assert_eq!(at_five, at_three);
        assert_relative_eq!(at_three, 0.1 * 3.0, max_relative = 1e-12);

        // Below the clamp the fit is evaluated where requested.
        let (at_one, _, _) = store.evaluate(0, 1.0);
        assert_relative_eq!(at_one, 0.1, max_relative = 1e-12);
    }

    #[test]
    fn test_out_of_range_clamp_index_is_reined_in() {
        let mut band = constant_band(0.1, 0.9, 0.1);
        band.ia_max = 99;
        let store = CoefficientStore::new(vec![band]);
        assert_eq!(store.band(0).ia_max, NAOT_VALS - 1);
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coefficients.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "0.95  0.01 0.2 -0.01 0.001 -0.0001  0.9 -0.05 0.002 0.0 0.0  \
             0.1 0.03 -0.001 0.0 0.0  0.98 17"
        )
        .unwrap();
        writeln!(
            file,
            "0.97  0.02 0.15 -0.008 0.0008 -0.00008  0.92 -0.04 0.001 0.0 0.0  \
             0.08 0.02 -0.0008 0.0 0.0  0.76 19"
        )
        .unwrap();

        let store = CoefficientStore::from_file(&path).unwrap();
        assert_eq!(store.band_count(), 2);
        assert_relative_eq!(store.band(0).tgo, 0.95);
        assert_relative_eq!(store.band(1).normext_p0a3, 0.76);
        assert_eq!(store.band(0).ia_max, 17);
        assert_eq!(store.band(1).ia_max, 19);
    }

    #[test]
    fn test_from_file_rejects_truncated_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "0.95 0.01 0.2").unwrap();

        assert!(CoefficientStore::from_file(&path).is_err());
    }
}
