/// Vertex of the parabola through three (x, residual) samples.
///
/// The samples are the two-deep bracket history and the current point of
/// the grid descent, oldest first. Solving the three residual equations
/// for the quadratic coefficients and eliminating the constant term gives
///
/// ```text
/// xa = (r1 - r0) * (x2 - x0)
/// xb = (r2 - r0) * (x1 - x0)
/// x_min = 0.5 * (xa * (x2 + x0) - xb * (x1 + x0)) / (xa - xb)
/// ```
///
/// Returns `None` when the fit degenerates: collinear or identical
/// residuals drive `xa - xb` to zero and the vertex to a non-finite value.
pub fn parabolic_minimum(
    oldest: (f64, f64),
    middle: (f64, f64),
    current: (f64, f64),
) -> Option<f64> {
    let (x2, r2) = oldest;
    let (x1, r1) = middle;
    let (x0, r0) = current;

    let xa = (r1 - r0) * (x2 - x0);
    let xb = (r2 - r0) * (x1 - x0);
    let x_min = 0.5 * (xa * (x2 + x0) - xb * (x1 + x0)) / (xa - xb);

    x_min.is_finite().then_some(x_min)
}
