//! Maximum-likelihood and MAP fitters for Dirichlet-family models.
//!
//! Each fitter is an [`Optimizable`](dirfit_core::optimizer::Optimizable)
//! implementing one update rule over its sufficient statistics, meant to
//! be driven by the iteration machinery in `dirfit-core`:
//!
//! - [`dirichlet::DirichletMle`]: Newton updates for the asymmetric
//!   Dirichlet concentration vector
//! - [`symmetric::SymmetricDirichletMle`]: univariate Newton updates for
//!   a shared concentration
//! - [`symmetric::SymmetricDirichletFixedPoint`]: precision-space
//!   fixed-point updates for the same shared concentration
//! - [`dirichlet_multinomial::SymmetricDirichletMultinomialMap`]:
//!   fixed-point updates for the Dirichlet-Multinomial concentration
//!   under a Gamma hyperprior
//! - [`dirichlet_multinomial::DirichletMultinomialMle`]: fixed-point
//!   updates for the asymmetric Dirichlet-Multinomial concentration
//!   vector
//!
//! Datasets of proportions are consumed in log space; count datasets are
//! consumed as `f64` matrices so fractional rescalings fit too.

pub mod dirichlet;
pub mod dirichlet_multinomial;
pub mod symmetric;

pub use dirichlet::DirichletMle;
pub use dirichlet_multinomial::{DirichletMultinomialMle, SymmetricDirichletMultinomialMap};
pub use symmetric::{SymmetricDirichletFixedPoint, SymmetricDirichletMle, SymmetricDirichletStats};
