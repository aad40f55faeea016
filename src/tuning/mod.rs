//! Parameter model, auto-tuning strategies and the coupling pass

pub mod coupling;
pub mod params;
pub mod tuner;

pub use coupling::{enforce_coupling, is_coupled};
pub use params::{
    snap_saturation, AttenuationCoefficients, CouplingRecord, FusionMethod, MagentaCompensation,
    ParameterClamp, ProcessingParameters, WhiteBalanceMethod,
};
pub use tuner::{select_magenta, tune, tune_with_report, TuneReport};
