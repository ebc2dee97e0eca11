//! Warping and shear function problems
//!
//! All three problems share the Laplacian stiffness matrix of the mesh and
//! are solved in centroidal coordinates. The pure Neumann problems are
//! singular by one rank; the system is made definite by pinning the first
//! node, after which each solution is shifted so that its modulus weighted
//! mean over the section is zero.

use log::{debug, info};
use nalgebra::DVector;

use crate::analysis::{collect_elements, map_elements, AnalysisOptions, Deadline, Stage};
use crate::elements::{Tri6, WarpingIntegrals};
use crate::error::{SectionError, SectionResult};
use crate::math::sparse::sparse_matvec;
use crate::math::{principal_coordinate, solve_symmetric, Mat2, SparseMatrixBuilder, Vec6};
use crate::mesh::Mesh;
use crate::results::{BySide, GeometricProperties, Monosymmetry, WarpingProperties};

struct ElementTerms {
    nodes: [usize; 6],
    k: crate::math::Mat6,
    f_torsion: Vec6,
    f_shear: Option<(Vec6, Vec6)>,
    c: Vec6,
}

/// Global systems of the warping stage
struct Assembly {
    k: SparseMatrixBuilder,
    f_torsion: DVector<f64>,
    f_psi: DVector<f64>,
    f_phi: DVector<f64>,
    c: DVector<f64>,
}

fn assemble(
    elements: &[Tri6<'_>],
    n_nodes: usize,
    geom: &GeometricProperties,
    with_shear: bool,
    parallel: bool,
) -> Assembly {
    let terms = collect_elements(elements.len(), parallel, |i| {
        let el = &elements[i];
        let (k, f_torsion) = el.torsion_properties();
        let f_shear = with_shear
            .then(|| el.shear_load_vectors(geom.ixx_c, geom.iyy_c, geom.ixy_c, geom.nu_eff));
        ElementTerms {
            nodes: el.nodes,
            k,
            f_torsion,
            f_shear,
            c: el.shape_integral(),
        }
    });

    let mut asm = Assembly {
        k: SparseMatrixBuilder::new(n_nodes),
        f_torsion: DVector::zeros(n_nodes),
        f_psi: DVector::zeros(n_nodes),
        f_phi: DVector::zeros(n_nodes),
        c: DVector::zeros(n_nodes),
    };
    for t in &terms {
        asm.k.add_element_matrix(&t.nodes, &t.k);
        for (a, &n) in t.nodes.iter().enumerate() {
            asm.f_torsion[n] += t.f_torsion[a];
            asm.c[n] += t.c[a];
            if let Some((f_psi, f_phi)) = &t.f_shear {
                asm.f_psi[n] += f_psi[a];
                asm.f_phi[n] += f_phi[a];
            }
        }
    }
    debug!(
        "Warping assembly: {} equations, {} stiffness entries ({:.2}% sparse)",
        n_nodes,
        asm.k.nnz(),
        100.0 * asm.k.sparsity()
    );
    asm
}

/// Solves the singular Neumann systems by pinning node 0, then removes the
/// weighted mean `c . x / c . 1` from every solution
fn solve_pinned(
    k: &SparseMatrixBuilder,
    rhs: &[&DVector<f64>],
    c: &DVector<f64>,
    options: &AnalysisOptions,
) -> SectionResult<Vec<DVector<f64>>> {
    let n = k.size();
    let reduced: Vec<DVector<f64>> = rhs.iter().map(|f| f.rows(1, n - 1).into_owned()).collect();
    let solutions = solve_symmetric(&k.without_dof(0), &reduced, options.solver)?;

    let c_sum = c.sum();
    solutions
        .into_iter()
        .map(|x| {
            let mut full = DVector::zeros(n);
            full.rows_mut(1, n - 1).copy_from(&x);
            let mean = c.dot(&full) / c_sum;
            full.add_scalar_mut(-mean);
            if full.iter().all(|v| v.is_finite()) {
                Ok(full)
            } else {
                Err(SectionError::NumericalFailure(
                    "warping solution is not finite".to_string(),
                ))
            }
        })
        .collect()
}

/// Prepares the centroidal elements, checking the mesh first
fn centroidal_mesh(mesh: &Mesh, geom: &GeometricProperties) -> SectionResult<Mesh> {
    mesh.check_connectivity()?;
    Ok(mesh.shifted(-geom.cx, -geom.cy))
}

/// Torsion constant alone, without the shear function problems
pub(crate) fn torsion_constant(
    mesh: &Mesh,
    geom: &GeometricProperties,
    options: &AnalysisOptions,
    deadline: &Deadline,
) -> SectionResult<f64> {
    let centroidal = centroidal_mesh(mesh, geom)?;
    let elements = centroidal.tri6_elements()?;
    let asm = assemble(&elements, centroidal.num_nodes(), geom, false, options.parallel);

    deadline.check(Stage::Warping)?;
    let omega = solve_pinned(&asm.k, &[&asm.f_torsion], &asm.c, options)?
        .pop()
        .ok_or_else(|| SectionError::NumericalFailure("missing torsion solution".to_string()))?;

    let k_omega = sparse_matvec(&asm.k.to_csr(), &omega);
    Ok(geom.ixx_c + geom.iyy_c - omega.dot(&k_omega))
}

/// Runs the warping stage
pub(crate) fn calculate(
    mesh: &Mesh,
    geom: &GeometricProperties,
    options: &AnalysisOptions,
    deadline: &Deadline,
) -> SectionResult<WarpingProperties> {
    let centroidal = centroidal_mesh(mesh, geom)?;
    let elements = centroidal.tri6_elements()?;
    let asm = assemble(&elements, centroidal.num_nodes(), geom, true, options.parallel);

    deadline.check(Stage::Warping)?;
    let mut sols = solve_pinned(&asm.k, &[&asm.f_torsion, &asm.f_psi, &asm.f_phi], &asm.c, options)?
        .into_iter();
    let (Some(omega), Some(psi), Some(phi_shear)) = (sols.next(), sols.next(), sols.next()) else {
        return Err(SectionError::NumericalFailure(
            "missing warping solution".to_string(),
        ));
    };

    let (ixx, iyy, ixy) = (geom.ixx_c, geom.iyy_c, geom.ixy_c);
    let nu = geom.nu_eff;
    let ea = geom.ea;

    let k_omega = sparse_matvec(&asm.k.to_csr(), &omega);
    let j = ixx + iyy - omega.dot(&k_omega);
    if !(j > 0.0) {
        return Err(SectionError::NumericalFailure(format!(
            "non-positive torsion constant {j:e}"
        )));
    }

    let delta_s = 2.0 * (1.0 + nu) * (ixx * iyy - ixy * ixy);
    let element_values = |v: &DVector<f64>, nodes: &[usize; 6]| Vec6::from_fn(|a, _| v[nodes[a]]);

    let (wi, kappa, mono) = map_elements(
        elements.len(),
        options.parallel,
        (WarpingIntegrals::default(), [0.0; 3], [0.0; 4]),
        |i| {
            let el = &elements[i];
            let w = el.warping_integrals(ixx, iyy, ixy, &element_values(&omega, &el.nodes));
            let (kx, ky, kxy) = el.shear_coefficients(
                ixx,
                iyy,
                ixy,
                &element_values(&psi, &el.nodes),
                &element_values(&phi_shear, &el.nodes),
                nu,
            );
            (w, [kx, ky, kxy], el.monosymmetry_integrals(geom.phi))
        },
        |(wa, ka, ma), (wb, kb, mb)| {
            (
                wa + wb,
                [ka[0] + kb[0], ka[1] + kb[1], ka[2] + kb[2]],
                [ma[0] + mb[0], ma[1] + mb[1], ma[2] + mb[2], ma[3] + mb[3]],
            )
        },
    );

    // shear centre, elasticity approach (centroidal)
    let x_se = (nu / 2.0 * wi.sc_xint - asm.f_torsion.dot(&phi_shear)) / delta_s;
    let y_se = (nu / 2.0 * wi.sc_yint + asm.f_torsion.dot(&psi)) / delta_s;
    let (x11_se, y22_se) = principal_coordinate(geom.phi, x_se, y_se);

    // shear centre, Trefftz's approach (centroidal)
    let det = ixx * iyy - ixy * ixy;
    let x_st = (ixy * wi.i_xomega - iyy * wi.i_yomega) / det;
    let y_st = (ixx * wi.i_xomega - ixy * wi.i_yomega) / det;

    let gamma = wi.i_omega - wi.q_omega * wi.q_omega / ea - y_se * wi.i_xomega + x_se * wi.i_yomega;

    // shear areas
    let [kx, ky, kxy] = kappa;
    let ds2 = delta_s * delta_s;
    let alpha = Mat2::new(kx, kxy, kxy, ky) * (ea / ds2);
    let (s, c) = geom.phi.to_radians().sin_cos();
    let r = Mat2::new(c, s, -s, c);
    let alpha_p = r * alpha * r.transpose();

    let [int_x, int_y, int_11, int_22] = mono;
    let beta = Monosymmetry {
        x: BySide::new(-int_x / ixx + 2.0 * y_se, int_x / ixx - 2.0 * y_se),
        y: BySide::new(-int_y / iyy + 2.0 * x_se, int_y / iyy - 2.0 * x_se),
        p11: BySide::new(
            -int_11 / geom.i11_c + 2.0 * y22_se,
            int_11 / geom.i11_c - 2.0 * y22_se,
        ),
        p22: BySide::new(
            -int_22 / geom.i22_c + 2.0 * x11_se,
            int_22 / geom.i22_c - 2.0 * x11_se,
        ),
    };

    let props = WarpingProperties {
        j,
        omega: omega.iter().copied().collect(),
        psi_shear: psi.iter().copied().collect(),
        phi_shear: phi_shear.iter().copied().collect(),
        delta_s,
        x_se: x_se + geom.cx,
        y_se: y_se + geom.cy,
        x11_se,
        y22_se,
        x_st: x_st + geom.cx,
        y_st: y_st + geom.cy,
        gamma,
        a_sx: ds2 / kx,
        a_sy: ds2 / ky,
        a_sxy: ds2 / kxy,
        a_s11: ea / alpha_p[(0, 0)],
        a_s22: ea / alpha_p[(1, 1)],
        beta,
    };

    info!(
        "Warping analysis: J = {:.6e}, Gamma = {:.6e}, shear centre = ({:.6}, {:.6})",
        props.j, props.gamma, props.x_se, props.y_se
    );
    Ok(props)
}
