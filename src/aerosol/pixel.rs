/// Per-pixel inputs to the aerosol retrieval.
///
/// `troatm` holds the TOA reflectance of every reflective band (fill values
/// for bands the driver excluded); a band takes part in the retrieval iff
/// its `erelc` ratio weight is positive. `iband1` is the driver band whose
/// corrected reflectance anchors the inter-band ratios over land.
#[derive(Debug, Clone)]
pub struct PixelInputs {
    pub troatm: Vec<f64>,
    pub erelc: Vec<f64>,
    pub iband1: usize,
    pub water: bool,
    pub eps: f64,
}

impl PixelInputs {
    pub fn new(
        troatm: Vec<f64>,
        erelc: Vec<f64>,
        iband1: usize,
        water: bool,
        eps: f64,
    ) -> Result<Self, String> {
        if troatm.len() != erelc.len() {
            return Err(format!(
                "troatm has {} bands but erelc has {}",
                troatm.len(),
                erelc.len()
            ));
        }

        if iband1 >= troatm.len() {
            return Err(format!(
                "driver band {} out of range for {} bands",
                iband1,
                troatm.len()
            ));
        }

        // Over land the driver band anchors the ratios but contributes no
        // residual term of its own, so at least one other band must carry a
        // positive weight; over water the driver band itself suffices.
        let participating = erelc
            .iter()
            .enumerate()
            .any(|(ib, &w)| w > 0.0 && (water || ib != iband1));
        if !participating {
            return Err("no band with a positive ratio weight".to_string());
        }

        Ok(PixelInputs {
            troatm,
            erelc,
            iband1,
            water,
            eps,
        })
    }

    pub fn band_count(&self) -> usize {
        self.troatm.len()
    }
}

/// Outcome of one per-pixel retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalResult {
    /// Retrieved AOT at 550 nm.
    pub raot: f64,
    /// RMS model residual at the retrieved AOT.
    pub residual: f64,
    /// Grid index hint for warm-starting the next pixel's search.
    pub iaots: usize,
}
